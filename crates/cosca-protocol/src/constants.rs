/// Level of the organization's root member (the godfather).
pub const ROOT_LEVEL: u32 = 0;

/// Default minimum descendant count for a member to be reported as a big boss.
pub const DEFAULT_BIG_BOSS_THRESHOLD: usize = 4;

/// Maximum hierarchy depth walked when relevelling a subtree.
/// Guards against a corrupted superior chain looping forever.
pub const MAX_HIERARCHY_DEPTH: u32 = 1024;
