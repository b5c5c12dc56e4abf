//! Configuration section definitions.
//!
//! Each module corresponds to a section in `frontserve.toml`:
//!
//! | Module     | TOML Section              | Purpose                            |
//! |------------|---------------------------|------------------------------------|
//! | `cache`    | `[cache]`                 | Response cache bounds              |
//! | `pipeline` | `[pipeline]`              | Minify / gzip / versioning toggles |
//! | `resolver` | `[resolver]`, `[[routes]]`| Module specifier resolution        |
//! | `serve`    | `[serve]`                 | HTTP server and route table        |

mod cache;
mod pipeline;
mod resolver;
mod serve;

pub use cache::CacheConfig;
pub use pipeline::{PipelineConfig, UrlCacheStringMode};
pub use resolver::{ResolverConfig, RouteOverrideConfig};
pub use serve::{ElementsConfig, LibConfig, ServeConfig};
