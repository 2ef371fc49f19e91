use minilang::{Config, Driver};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::thread;

fn get_test_name() -> String {
    thread::current()
        .name()
        .unwrap()
        .to_string()
}

/// Runs the driver with `-a <file>` and parses the JSON that follows the
/// file header.
fn dump_ast(program: &str) -> serde_json::Value {
    let project_path = std::env!("CARGO_MANIFEST_DIR");
    let output_dir = format!("{}/target/test_outputs", project_path);
    let output_file = format!("{}/{}.json", output_dir, get_test_name());

    std::fs::create_dir_all(&output_dir).unwrap();
    let _ = std::fs::remove_file(&output_file);

    let args = vec!["minilang", "-a", &output_file, "-i", program, "--dry-run"];
    let config = Config::try_from(args).unwrap();
    let driver = Driver::new(config);

    driver.run().unwrap();

    let generated_content =
        std::fs::read_to_string(&output_file).expect("Failed to read output file");
    let (header, body) = generated_content.split_once('\n').unwrap();

    assert_eq!(header, format!("===== FILE {output_file} ====="));
    serde_json::from_str(body).unwrap()
}

#[test]
fn test_simple_ast() {
    let ast = dump_ast("a = 1 + 1");

    let expected = json!({
        "statements": [{
            "Assignment": {
                "identifier": "a",
                "value": {
                    "BinaryOp": {
                        "left": { "Number": { "value": 1, "line": 1 } },
                        "op": "Plus",
                        "right": { "Number": { "value": 1, "line": 1 } },
                        "line": 1
                    }
                },
                "line": 1
            }
        }]
    });

    assert_eq!(ast, expected, "Generated AST does not match");
}

#[test]
fn test_control_flow_ast() {
    let ast = dump_ast("while x < 2.5:\n    print(\"hi\", -x)\nelse_ = [1]");

    let expected = json!({
        "statements": [
            {
                "While": {
                    "condition": {
                        "BinaryOp": {
                            "left": { "Identifier": { "name": "x", "line": 1 } },
                            "op": "Lt",
                            "right": { "Number": { "value": 2.5, "line": 1 } },
                            "line": 1
                        }
                    },
                    "body": {
                        "statements": [{
                            "Print": {
                                "args": [
                                    { "String": { "value": "hi", "line": 2 } },
                                    {
                                        "UnaryOp": {
                                            "op": "Negate",
                                            "operand": { "Identifier": { "name": "x", "line": 2 } },
                                            "line": 2
                                        }
                                    }
                                ],
                                "line": 2
                            }
                        }]
                    },
                    "line": 1
                }
            },
            {
                "Assignment": {
                    "identifier": "else_",
                    "value": {
                        "List": {
                            "elements": [{ "Number": { "value": 1, "line": 3 } }],
                            "line": 3
                        }
                    },
                    "line": 3
                }
            }
        ]
    });

    assert_eq!(ast, expected, "Generated AST does not match");
}

#[test]
fn test_def_and_for_ast() {
    let ast = dump_ast("def f(a):\n    for i in range(a):\n        return i");

    let expected = json!({
        "statements": [{
            "Function": {
                "name": "f",
                "params": ["a"],
                "body": {
                    "statements": [{
                        "For": {
                            "variable": "i",
                            "iterable": {
                                "Range": {
                                    "start": null,
                                    "stop": { "Identifier": { "name": "a", "line": 2 } }
                                }
                            },
                            "body": {
                                "statements": [{
                                    "Return": {
                                        "value": { "Identifier": { "name": "i", "line": 3 } },
                                        "line": 3
                                    }
                                }]
                            },
                            "line": 2
                        }
                    }]
                },
                "line": 1
            }
        }]
    });

    assert_eq!(ast, expected, "Generated AST does not match");
}
