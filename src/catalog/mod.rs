//! Transient catalog records exchanged between album sources and the
//! reconciler, plus the slug rules that give them a canonical identity.

mod album;
mod artist;
pub mod slug;
mod track;

pub use album::Album;
pub use artist::Artist;
pub use slug::{album_slug, slug};
pub use track::Track;
