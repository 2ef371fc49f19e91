use clap::Parser;
use minilang::driver::{Config, Driver};
use termion::color;

fn main() {
    let config = Config::parse();

    if let Err(err) = Driver::new(config).run() {
        if termion::is_tty(&std::io::stderr()) {
            eprintln!(
                "{}{}{}",
                color::Fg(color::Red),
                err.render(),
                color::Fg(color::Reset)
            );
        } else {
            eprintln!("{}", err.render());
        }

        std::process::exit(1);
    }
}
