//! TIS/MOS/MOSC/PVRZ container I/O and the PVRZ sibling-file naming
//! scheme (spec §6).

pub mod mos;
pub mod naming;
pub mod pvrz;
pub mod signature;
pub mod tis;

pub use mos::{MosV1, MosV1Block, MosV2, MosV2Block};
pub use naming::{generate_mos_pvrz_name, generate_tis_pvrz_name};
pub use pvrz::PvrzPage;
pub use tis::{TisV1, TisV1Tile, TisV2, TisV2Tile};
