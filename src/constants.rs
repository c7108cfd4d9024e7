/// Venue key constants to ensure consistency across the codebase.
/// These are the user-facing names accepted by the CLI and the keys
/// used by the extractor factory.

pub const VISTA: &str = "vista";
pub const NEW_BEVERLY: &str = "new_beverly";
pub const VIDIOTS: &str = "vidiots";
pub const ACADEMY_MUSEUM: &str = "academy_museum";
pub const AMERICAN_CINEMATHEQUE: &str = "american_cinematheque";

/// All supported venue keys, in the order the aggregator runs them.
pub fn supported_venues() -> Vec<&'static str> {
    vec![
        VISTA,
        NEW_BEVERLY,
        VIDIOTS,
        ACADEMY_MUSEUM,
        AMERICAN_CINEMATHEQUE,
    ]
}
