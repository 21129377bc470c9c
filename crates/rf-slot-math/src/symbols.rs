//! Symbol definitions, per-cell symbol instances and reel strips
//!
//! Symbol names are interned once at configuration time into [`SymbolId`]s.
//! Boards and strips carry ids only; names are resolved through the
//! [`SymbolTable`] when events are emitted.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// SYMBOL IDENTITY
// ═══════════════════════════════════════════════════════════════════════════════

/// Interned symbol identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(pub u16);

/// Static definition of a symbol name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolDef {
    /// Display name (e.g. "H1", "W", "S")
    pub name: String,
    /// Special-symbol categories this name belongs to (e.g. "scatter", "wild")
    pub categories: Vec<String>,
}

impl SymbolDef {
    pub fn is_special(&self) -> bool {
        !self.categories.is_empty()
    }
}

/// Name ↔ id registry built from the game configuration
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    defs: Vec<SymbolDef>,
    by_name: HashMap<String, SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a name, returning the existing id if already known
    pub fn intern(&mut self, name: &str) -> SymbolId {
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }
        let id = SymbolId(self.defs.len() as u16);
        self.defs.push(SymbolDef {
            name: name.to_string(),
            categories: Vec::new(),
        });
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Attach a special category to a symbol name
    pub fn add_category(&mut self, name: &str, category: &str) -> SymbolId {
        let id = self.intern(name);
        let def = &mut self.defs[id.0 as usize];
        if !def.categories.iter().any(|c| c == category) {
            def.categories.push(category.to_string());
        }
        id
    }

    pub fn id(&self, name: &str) -> Option<SymbolId> {
        self.by_name.get(name).copied()
    }

    pub fn def(&self, id: SymbolId) -> &SymbolDef {
        &self.defs[id.0 as usize]
    }

    pub fn name(&self, id: SymbolId) -> &str {
        &self.defs[id.0 as usize].name
    }

    pub fn is_special(&self, id: SymbolId) -> bool {
        self.def(id).is_special()
    }

    pub fn in_category(&self, id: SymbolId, category: &str) -> bool {
        self.def(id).categories.iter().any(|c| c == category)
    }

    /// All ids registered under a category, in registration order
    pub fn category_members(&self, category: &str) -> Vec<SymbolId> {
        (0..self.defs.len() as u16)
            .map(SymbolId)
            .filter(|id| self.in_category(*id, category))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SYMBOL INSTANCES
// ═══════════════════════════════════════════════════════════════════════════════

/// Value carried by a special symbol instance.
///
/// Bomb and multiplier symbols behave differently during evaluation, so the
/// value is a tagged union rather than a loose key/value bag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SymbolPayload {
    /// Positional multiplier applied to wins the symbol takes part in
    Multiplier { value: f64 },
    /// Bomb that pays `value × prize` on its own
    Bomb { value: f64, prize: f64 },
}

/// Mutable per-instance attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<SymbolPayload>,
    /// Produced by an expansion modifier rather than landed from the strip
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub expanded: bool,
    /// Held in place across free spins
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub sticky: bool,
}

/// One symbol occupying a board cell
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub id: SymbolId,
    pub special: bool,
    pub attributes: SymbolAttributes,
}

impl Symbol {
    pub fn new(id: SymbolId, special: bool) -> Self {
        Self {
            id,
            special,
            attributes: SymbolAttributes::default(),
        }
    }

    pub fn with_payload(mut self, payload: SymbolPayload) -> Self {
        self.attributes.payload = Some(payload);
        self
    }

    /// Positional multiplier, if this instance carries one
    pub fn multiplier(&self) -> Option<f64> {
        match self.attributes.payload {
            Some(SymbolPayload::Multiplier { value }) => Some(value),
            _ => None,
        }
    }

    /// Bomb `(value, prize)`, if this instance is a bomb
    pub fn bomb(&self) -> Option<(f64, f64)> {
        match self.attributes.payload {
            Some(SymbolPayload::Bomb { value, prize }) => Some((value, prize)),
            _ => None,
        }
    }

    pub fn set_multiplier(&mut self, value: f64) {
        self.attributes.payload = Some(SymbolPayload::Multiplier { value });
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REEL STRIPS
// ═══════════════════════════════════════════════════════════════════════════════

/// Ordered symbol sequence for one reel
#[derive(Debug, Clone, PartialEq)]
pub struct ReelStrip {
    pub symbols: Vec<SymbolId>,
    pub reel_index: usize,
}

impl ReelStrip {
    pub fn new(reel_index: usize, symbols: Vec<SymbolId>) -> Self {
        Self {
            symbols,
            reel_index,
        }
    }

    /// Symbol at a (possibly negative or overflowing) position, wrapping
    pub fn symbol_at(&self, position: i64) -> SymbolId {
        let len = self.symbols.len() as i64;
        self.symbols[position.rem_euclid(len) as usize]
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Stop indices holding any of the given symbols
    pub fn stops_matching(&self, targets: &[SymbolId]) -> Vec<usize> {
        self.symbols
            .iter()
            .enumerate()
            .filter(|(_, id)| targets.contains(id))
            .map(|(pos, _)| pos)
            .collect()
    }
}

/// A named set of strips, one per reel
#[derive(Debug, Clone, PartialEq)]
pub struct ReelSet {
    pub id: String,
    pub strips: Vec<ReelStrip>,
}

impl ReelSet {
    pub fn strip(&self, reel: usize) -> &ReelStrip {
        &self.strips[reel]
    }

    pub fn num_reels(&self) -> usize {
        self.strips.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_idempotent() {
        let mut table = SymbolTable::new();
        let a = table.intern("H1");
        let b = table.intern("H1");
        let c = table.intern("L1");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(table.len(), 2);
        assert_eq!(table.name(c), "L1");
    }

    #[test]
    fn test_categories() {
        let mut table = SymbolTable::new();
        table.intern("H1");
        let s = table.add_category("S", "scatter");
        table.add_category("S", "scatter");
        assert!(table.is_special(s));
        assert!(table.in_category(s, "scatter"));
        assert_eq!(table.def(s).categories.len(), 1);
        assert_eq!(table.category_members("scatter"), vec![s]);
        assert!(!table.is_special(table.id("H1").unwrap()));
    }

    #[test]
    fn test_strip_wraps_both_directions() {
        let strip = ReelStrip::new(0, vec![SymbolId(0), SymbolId(1), SymbolId(2)]);
        assert_eq!(strip.symbol_at(3), SymbolId(0));
        assert_eq!(strip.symbol_at(-1), SymbolId(2));
        assert_eq!(strip.symbol_at(7), SymbolId(1));
    }

    #[test]
    fn test_payload_accessors() {
        let bomb = Symbol::new(SymbolId(3), true).with_payload(SymbolPayload::Bomb {
            value: 5.0,
            prize: 2.0,
        });
        assert_eq!(bomb.bomb(), Some((5.0, 2.0)));
        assert_eq!(bomb.multiplier(), None);

        let mut wild = Symbol::new(SymbolId(4), true);
        wild.set_multiplier(3.0);
        assert_eq!(wild.multiplier(), Some(3.0));
    }
}
