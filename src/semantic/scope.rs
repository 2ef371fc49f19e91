use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize)]
pub enum Type {
    Int,
    Float,
    Bool,
    Str,
    List,
    Dict,
    Function,
    Unknown,
}

impl Type {
    pub fn is_numeric(self) -> bool {
        matches!(self, Type::Int | Type::Float | Type::Bool)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Type::Int => "int",
            Type::Float => "float",
            Type::Bool => "bool",
            Type::Str => "str",
            Type::List => "list",
            Type::Dict => "dict",
            Type::Function => "function",
            Type::Unknown => "unknown",
        })
    }
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct TypeInfo {
    #[serde(rename = "type")]
    pub typ: Type,
    pub initialized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arity: Option<usize>,
}

impl TypeInfo {
    pub fn var(typ: Type) -> Self {
        Self {
            typ,
            initialized: true,
            arity: None,
        }
    }

    pub fn uninitialized() -> Self {
        Self {
            typ: Type::Unknown,
            initialized: false,
            arity: None,
        }
    }

    pub fn function(arity: usize) -> Self {
        Self {
            typ: Type::Function,
            initialized: true,
            arity: Some(arity),
        }
    }
}

/// Block scopes, innermost last. Index 0 is the global scope and is never
/// popped.
pub struct SymbolTable {
    scopes: Vec<HashMap<String, TypeInfo>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&TypeInfo> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn declare(&mut self, name: &str, info: TypeInfo) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), info);
        }
    }

    /// Updates the nearest visible binding of `name`, or declares it in the
    /// innermost scope when nothing is visible.
    pub fn assign(&mut self, name: &str, typ: Type) {
        let existing = self
            .scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(name));

        match existing {
            Some(info) => {
                info.typ = typ;
                info.initialized = true;
            }
            None => self.declare(name, TypeInfo::var(typ)),
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn into_global(mut self) -> HashMap<String, TypeInfo> {
        self.scopes.truncate(1);
        self.scopes.pop().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lookup_walks_outward() {
        let mut table = SymbolTable::new();
        table.declare("x", TypeInfo::var(Type::Int));
        table.push_scope();
        table.declare("y", TypeInfo::var(Type::Str));

        assert_eq!(table.lookup("x").map(|i| i.typ), Some(Type::Int));
        assert_eq!(table.lookup("y").map(|i| i.typ), Some(Type::Str));

        table.pop_scope();
        assert_eq!(table.lookup("y"), None);
    }

    #[test]
    fn assign_updates_enclosing_binding() {
        let mut table = SymbolTable::new();
        table.declare("x", TypeInfo::uninitialized());
        table.push_scope();
        table.assign("x", Type::Float);
        table.assign("z", Type::Int);
        table.pop_scope();

        let globals = table.into_global();
        assert_eq!(globals.get("x"), Some(&TypeInfo::var(Type::Float)));
        assert_eq!(globals.get("z"), None);
    }

    #[test]
    fn global_scope_survives_extra_pops() {
        let mut table = SymbolTable::new();
        table.pop_scope();
        table.declare("x", TypeInfo::var(Type::Int));

        assert_eq!(table.depth(), 1);
        assert!(table.lookup("x").is_some());
    }
}
