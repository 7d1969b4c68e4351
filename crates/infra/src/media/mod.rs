//! Image handling for chat ingestion: pulling media from the messaging
//! provider and storing it in the public blob store.

pub mod in_memory;
pub mod supabase;
pub mod r#trait;
pub mod whatsapp_media;

pub use in_memory::{InMemoryBlobStore, InMemoryMediaSource};
pub use supabase::SupabaseBlobStore;
pub use r#trait::{BlobError, BlobStore, MediaBlob, MediaSource};
pub use whatsapp_media::WhatsAppMediaSource;
