//! Domain model (ids, uploaded items, stored archives, errors).

pub mod archive;
pub mod errors;
pub mod ids;
pub mod item;

pub use self::archive::{ArchiveInfo, StoredArchive};
pub use self::errors::{
    ArchiveError, ErrorKind, InvalidIdentifier, PipelineError, StoreError,
};
pub use self::ids::ArchiveId;
pub use self::item::UploadedItem;
