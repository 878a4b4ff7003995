pub mod toml_loader;

pub use toml_loader::{load_profile_corpus, load_style_profiles};
