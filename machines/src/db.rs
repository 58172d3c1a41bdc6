//! Per-title ROM hint database, keyed by the truncated BLAKE3 hash.
//!
//! Hints cover behaviour that cannot be probed from the ROM itself: mapper
//! overrides, PAL-only releases, and titles that expect a paddle or light
//! phaser in port 1. The PAL-only list follows SMS Power.

use crate::rom::HASH_LENGTH;

/// Master System / Game Gear hints.
pub mod sms_hint {
    pub const PAL_ONLY: u16 = 0x0001;
    pub const PADDLE_ONLY: u16 = 0x0002;
    pub const SMS1_VDP: u16 = 0x0004;
    pub const LIGHT_PHASER: u16 = 0x0008;
    pub const MAPPER_NONE: u16 = 0x0010;
    pub const MAPPER_SEGA: u16 = 0x0020;
    pub const MAPPER_CODEMASTERS: u16 = 0x0040;
    pub const MAPPER_KOREAN: u16 = 0x0080;
}

/// SG-1000 hints.
pub mod sg_hint {
    pub const MAPPER_GRAPHIC_BOARD: u16 = 0x0020;
}

struct DbEntry {
    hash: [u8; HASH_LENGTH],
    hints: u16,
}

static SMS_DB: &[DbEntry] = &[
    // 94 Super World Cup Soccer (Korea)
    DbEntry {
        hash: [0xb2, 0x3a, 0x98, 0xb2, 0xcf, 0x55, 0x8c, 0x2b, 0x28, 0xfe, 0x97, 0x23],
        hints: sms_hint::MAPPER_KOREAN,
    },
    // The Adams Family
    DbEntry {
        hash: [0x4b, 0xe4, 0x54, 0xc3, 0xd8, 0xec, 0x0e, 0x00, 0x37, 0xe3, 0x77, 0x2d],
        hints: sms_hint::PAL_ONLY,
    },
    // Alex Kidd BMX Trial
    DbEntry {
        hash: [0x3a, 0xfb, 0xfd, 0xc1, 0x15, 0x41, 0x07, 0x36, 0x1a, 0x24, 0xdc, 0x74],
        hints: sms_hint::PADDLE_ONLY,
    },
    // Assault City (Light Phaser)
    DbEntry {
        hash: [0x2e, 0x38, 0xb6, 0xe0, 0xb1, 0x48, 0x16, 0x66, 0x58, 0x3d, 0xb6, 0xea],
        hints: sms_hint::LIGHT_PHASER,
    },
    // Back to the Future II
    DbEntry {
        hash: [0xb0, 0xfb, 0xd1, 0xbc, 0xd0, 0xc3, 0x54, 0x7e, 0x2a, 0x9b, 0xa8, 0x5d],
        hints: sms_hint::PAL_ONLY,
    },
    // Back to the Future III
    DbEntry {
        hash: [0xa2, 0xab, 0x97, 0xd8, 0x0c, 0xc3, 0x0a, 0x4f, 0x92, 0xf1, 0x57, 0x9c],
        hints: sms_hint::PAL_ONLY,
    },
    // Bart vs. The Space Mutants
    DbEntry {
        hash: [0xb2, 0x51, 0x35, 0x66, 0xdb, 0x41, 0xe6, 0xfa, 0xc8, 0xb8, 0xf4, 0x55],
        hints: sms_hint::PAL_ONLY,
    },
    // Bobble Bobble (Korea)
    DbEntry {
        hash: [0xfe, 0x90, 0xf9, 0x1d, 0xa5, 0x15, 0x56, 0xaf, 0xb6, 0x1e, 0xf7, 0x53],
        hints: sms_hint::MAPPER_NONE,
    },
    // C_So! (Korea)
    DbEntry {
        hash: [0x60, 0x31, 0x3c, 0x6c, 0xd3, 0xdd, 0xd4, 0x8c, 0x2d, 0xd3, 0x1b, 0x0f],
        hints: sms_hint::MAPPER_NONE,
    },
    // California Games II (Europe)
    DbEntry {
        hash: [0x31, 0x9f, 0x17, 0x11, 0xb7, 0x3a, 0x84, 0x07, 0x54, 0xe2, 0xd2, 0x26],
        hints: sms_hint::PAL_ONLY,
    },
    // Champions of Europe (Europe)
    DbEntry {
        hash: [0x2e, 0xf0, 0xfb, 0x8e, 0x95, 0xc6, 0xac, 0x84, 0x3c, 0xd3, 0xc9, 0xb2],
        hints: sms_hint::MAPPER_SEGA,
    },
    // Chase H.Q.
    DbEntry {
        hash: [0xc4, 0xd1, 0x6a, 0xb6, 0x14, 0xd0, 0x79, 0xb0, 0x74, 0x91, 0xdf, 0xdd],
        hints: sms_hint::PAL_ONLY,
    },
    // Cosmic Spacehead
    DbEntry {
        hash: [0x2b, 0x10, 0x37, 0x73, 0x7b, 0xa8, 0x4a, 0x46, 0x86, 0xf2, 0x07, 0xb2],
        hints: sms_hint::PAL_ONLY,
    },
    // Desert Strike
    DbEntry {
        hash: [0xcb, 0x99, 0x91, 0xcb, 0x97, 0xb5, 0xfb, 0xb7, 0xbc, 0xd3, 0x86, 0xd9],
        hints: sms_hint::PAL_ONLY,
    },
    // FA Tetris (Korea)
    DbEntry {
        hash: [0x5c, 0x44, 0xde, 0xcf, 0x6e, 0x78, 0x2c, 0xf2, 0x41, 0xb7, 0xaf, 0x17],
        hints: sms_hint::MAPPER_NONE,
    },
    // Flashpoint (Korea)
    DbEntry {
        hash: [0x09, 0xd5, 0xc4, 0x11, 0xf9, 0x00, 0x34, 0x10, 0xaf, 0x7e, 0xff, 0x74],
        hints: sms_hint::MAPPER_NONE,
    },
    // Fantastic Dizzy
    DbEntry {
        hash: [0x02, 0x81, 0xd8, 0x15, 0xbd, 0xb9, 0x7a, 0xd6, 0x7a, 0xc8, 0x14, 0x57],
        hints: sms_hint::PAL_ONLY,
    },
    // Galactic Protector
    DbEntry {
        hash: [0x7d, 0xca, 0x21, 0xc0, 0xcc, 0xda, 0x24, 0xa0, 0xf7, 0x4d, 0x28, 0xcb],
        hints: sms_hint::PADDLE_ONLY,
    },
];

static SG_DB: &[DbEntry] = &[
    // Terebi Oekaki (Japan)
    DbEntry {
        hash: [0xb4, 0x07, 0x1b, 0x78, 0x8e, 0xfb, 0x35, 0x83, 0xf8, 0x95, 0x39, 0xd4],
        hints: sg_hint::MAPPER_GRAPHIC_BOARD,
    },
];

fn lookup(db: &[DbEntry], hash: &[u8; HASH_LENGTH]) -> u16 {
    db.iter()
        .find(|entry| entry.hash == *hash)
        .map(|entry| entry.hints)
        .unwrap_or(0)
}

/// Hints for a Master System / Game Gear ROM, or zero.
pub fn sms_hints(hash: &[u8; HASH_LENGTH]) -> u16 {
    lookup(SMS_DB, hash)
}

/// Hints for an SG-1000 ROM, or zero.
pub fn sg_hints(hash: &[u8; HASH_LENGTH]) -> u16 {
    lookup(SG_DB, hash)
}
