//! Hierarchical archive container backing rig's persistent state.

mod archive;
mod codec;

pub use archive::{entry_name, ArchiveWriter, StateArchive, ROOT_GROUP};
pub use codec::{decode_value, encode_value, TAG_ARRAY, TAG_OPAQUE};
