use graphviz_rust::{
    cmd::{CommandArg, Format},
    dot_generator::*,
    dot_structures::*,
    exec,
    printer::{DotPrinter, PrinterContext},
};

use super::cfg::Cfg;
use super::tac::{Instruction, Opcode};

fn build_graph(name: &str, cfg: &Cfg, instrs: &[Instruction]) -> Graph {
    let mut g = graph!(strict di id!(name));
    let unreachable = cfg.unreachable_blocks();

    for block in cfg.get_blocks().iter() {
        let id = format!("B{}", block.get_id());

        let mut label = format!("B{}\\l", block.get_id());
        for instr in instrs[block.get_range()].iter() {
            label.push_str(&escape(&instr.to_string()));
            label.push_str("\\l");
        }

        if unreachable.contains(&block.get_id()) {
            g.add_stmt(stmt!(node!(id;
                attr!("shape", "box"),
                attr!("fontname", "monospace"),
                attr!("style", "dashed"),
                attr!("label", esc label)
            )));
        } else {
            g.add_stmt(stmt!(node!(id;
                attr!("shape", "box"),
                attr!("fontname", "monospace"),
                attr!("label", esc label)
            )));
        }

        let ends_in_branch = instrs[block.get_range()]
            .last()
            .is_some_and(|instr| instr.op == Opcode::IfFalse);

        for (i, successor) in block.get_successors().iter().enumerate() {
            let to = format!("B{successor}");

            if ends_in_branch {
                let taken = if i == 0 { "true" } else { "false" };
                g.add_stmt(stmt!(edge!(node_id!(id) => node_id!(to); attr!("label", taken))));
            } else {
                g.add_stmt(stmt!(edge!(node_id!(id) => node_id!(to))));
            }
        }
    }

    g
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// DOT source for the basic-block graph of `instrs`.
pub fn cfg_to_dot(name: &str, instrs: &[Instruction]) -> String {
    let cfg = Cfg::new(instrs);
    let g = build_graph(name, &cfg, instrs);

    g.print(&mut PrinterContext::default())
}

/// Renders the graph through the `dot` binary into `output`.
pub fn cfg_to_svg(name: &str, instrs: &[Instruction], output: &str) -> std::io::Result<()> {
    let cfg = Cfg::new(instrs);
    let g = build_graph(name, &cfg, instrs);

    exec(
        g,
        &mut PrinterContext::default(),
        vec![
            CommandArg::Format(Format::Svg),
            CommandArg::Output(output.to_string()),
        ],
    )
    .map(|_| ())
}
