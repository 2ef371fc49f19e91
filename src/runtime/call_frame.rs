use std::collections::HashMap;

use super::value::Value;

pub type Env = HashMap<String, Value>;

/// Caller state saved by CALL and restored by the matching RETURN.
#[derive(Debug)]
pub struct CallFrame {
    return_pc: usize,
    saved_env: Env,
    result: Option<String>,
}

impl CallFrame {
    pub fn new(return_pc: usize, saved_env: Env, result: Option<String>) -> Self {
        Self {
            return_pc,
            saved_env,
            result,
        }
    }

    pub fn get_return_pc(&self) -> usize {
        self.return_pc
    }

    /// Hands back the caller's environment with the call's result bound.
    pub fn restore(self, value: Value) -> Env {
        let mut env = self.saved_env;
        if let Some(result) = self.result {
            env.insert(result, value);
        }

        env
    }
}
