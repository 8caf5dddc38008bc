/// Operator sessions held at once.
pub const MAX_SESSIONS: usize = 1024;

pub const MAX_SESSION_NAME_LEN: usize = 256;

/// Overlay entries one session may hold before it must commit or discard.
pub const MAX_OVERLAY_ENTRIES_PER_SESSION: usize = 4096;

pub const MAX_PAGE_SIZE: usize = 200;

pub const MAX_SEARCH_LEN: usize = 128;

/// Longest range an Extend coverage may span, in days.
pub const MAX_EXTEND_DAYS: i64 = 62;

/// Property ids accepted across both sides of one Split proposal.
pub const MAX_SPLIT_PROPERTIES: usize = 512;
