mod policy;

pub use policy::{
    ContextWindowPolicy, CHARS_PER_TOKEN, DEFAULT_RESERVED_TOKENS, DEFAULT_TOKEN_BUDGET,
    DEFAULT_TRIM_TARGET,
};
