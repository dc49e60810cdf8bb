//! 库存应用的本地存储与后台任务：偏好存储、物品存储和定时笑话获取

pub mod items;
pub mod joke;
pub mod preferences;

pub use items::{Item, ItemFilter, ItemStore};
pub use joke::{HttpJokeSource, JokeFetchJob, JokeJobConfig};
pub use preferences::{PreferenceStore, Preferences};
