use std::collections::HashMap;
use std::fmt;

/// Index of a variable's data word in the emitted `.data` section.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VarId(usize);

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A name as seen from top-level code (`None`) or from inside a function.
pub type Scoped<'a> = (Option<&'a str>, &'a str);

/// Every variable, temporary and parameter gets one word-sized slot. Names
/// inside a function are keyed by that function, so callers and callees
/// never share storage.
#[derive(Debug, Default)]
pub struct VarTable<'a> {
    map: HashMap<Scoped<'a>, VarId>,
    names: Vec<Scoped<'a>>,
}

impl<'a> VarTable<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_id(&mut self, scope: Option<&'a str>, name: &'a str) -> VarId {
        match self.map.get(&(scope, name)) {
            Some(id) => *id,
            None => {
                let id = VarId(self.names.len());

                self.map.insert((scope, name), id);
                self.names.push((scope, name));

                id
            }
        }
    }

    /// `(slot, qualified name)` in allocation order.
    pub fn slots(&self) -> impl Iterator<Item = (VarId, String)> + '_ {
        self.names.iter().enumerate().map(|(i, (scope, name))| {
            let qualified = match scope {
                Some(func) => format!("{func}.{name}"),
                None => name.to_string(),
            };

            (VarId(i), qualified)
        })
    }
}
