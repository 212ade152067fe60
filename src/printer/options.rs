//! Rendering switches.

use bitflags::bitflags;

bitflags! {
    /// Independent switches controlling how a symbol tree is rendered.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RenderOptions: u32 {
        /// `T?`, `T!`, `[T]` and `[K : V]` for the standard library generics.
        const SYNTHESIZE_SUGAR_ON_TYPES = 1 << 0;
        const DISPLAY_DEBUGGER_GENERATED_MODULE = 1 << 1;
        /// Print the context of an entity in front of its name.
        const QUALIFY_ENTITIES = 1 << 2;
        const DISPLAY_EXTENSION_CONTEXTS = 1 << 3;
        const DISPLAY_UNMANGLED_SUFFIX = 1 << 4;
        const DISPLAY_MODULE_NAMES = 1 << 5;
        /// Spell out each specialization instead of a single `specialized ` prefix.
        const DISPLAY_GENERIC_SPECIALIZATIONS = 1 << 6;
        const DISPLAY_PROTOCOL_CONFORMANCES = 1 << 7;
        const DISPLAY_WHERE_CLAUSES = 1 << 8;
        const DISPLAY_ENTITY_TYPES = 1 << 9;
        const SHORTEN_PARTIAL_APPLY = 1 << 10;
        const SHORTEN_THUNK = 1 << 11;
        const SHORTEN_VALUE_WITNESS = 1 << 12;
        const SHORTEN_ARCHETYPE = 1 << 13;
        const SHOW_PRIVATE_DISCRIMINATORS = 1 << 14;
        const SHOW_FUNCTION_ARGUMENT_TYPES = 1 << 15;
    }
}

impl RenderOptions {
    const SHORTENINGS: RenderOptions = RenderOptions::SHORTEN_PARTIAL_APPLY
        .union(RenderOptions::SHORTEN_THUNK)
        .union(RenderOptions::SHORTEN_VALUE_WITNESS)
        .union(RenderOptions::SHORTEN_ARCHETYPE);

    /// Short names with sugar and qualified entities, nothing else.
    pub fn simplified() -> Self {
        RenderOptions::SYNTHESIZE_SUGAR_ON_TYPES
            | RenderOptions::QUALIFY_ENTITIES
            | RenderOptions::SHORTENINGS
    }
}

impl Default for RenderOptions {
    /// Everything except the shortenings.
    fn default() -> Self {
        RenderOptions::all().difference(RenderOptions::SHORTENINGS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let default = RenderOptions::default();
        assert!(default.contains(RenderOptions::SYNTHESIZE_SUGAR_ON_TYPES));
        assert!(default.contains(RenderOptions::DISPLAY_MODULE_NAMES));
        assert!(!default.intersects(RenderOptions::SHORTENINGS));

        let simplified = RenderOptions::simplified();
        assert!(simplified.contains(RenderOptions::SHORTEN_THUNK));
        assert!(!simplified.contains(RenderOptions::DISPLAY_MODULE_NAMES));
        assert!(!simplified.contains(RenderOptions::SHOW_FUNCTION_ARGUMENT_TYPES));
    }
}
