//! Container magic signatures and the dimensional constants fixed in
//! spec §6. Modeled as plain constants, not a singleton type, per spec §9
//! ("the bin packer's statics are pure constants; model as constants").

pub const TIS_SIG: &[u8; 4] = b"TIS ";
pub const MOS_SIG: &[u8; 4] = b"MOS ";
pub const MOSC_SIG: &[u8; 4] = b"MOSC";
pub const VERSION_V1: &[u8; 4] = b"V1  ";
pub const VERSION_V2: &[u8; 4] = b"V2  ";

pub const PVR_MAGIC: u32 = 0x0352_5650;

/// Side length of one TIS tile / one MOS block.
pub const TILE_DIM: u32 = 0x40;

/// Bytes of one V1 palette (256 RGBA entries).
pub const PALETTE_BYTES: usize = 1024;

/// Bytes of one tile's 8-bit index plane (`TILE_DIM * TILE_DIM`).
pub const INDICES_BYTES: usize = (TILE_DIM * TILE_DIM) as usize;

/// Size in bytes of one TIS V1 tile record: palette + indices.
pub const TIS_V1_TILE_SIZE: usize = 0x1400;

/// Size in bytes of one TIS V2 tile record: `page, x, y` as `int32`s.
pub const TIS_V2_TILE_SIZE: usize = 0x000c;

/// Size of every container's fixed header region.
pub const HEADER_SIZE: u32 = 0x18;

const _: () = assert!(TIS_V1_TILE_SIZE == PALETTE_BYTES + INDICES_BYTES);
