#![allow(dead_code)]

// bluetooth.h
pub const BTPROTO_HCI: i32 = 1;

// hci.h
pub const HCI_MAX_DEV: u16 = 16;

pub const HCI_CHANNEL_RAW: u16 = 0;
pub const HCI_CHANNEL_USER: u16 = 1;
pub const HCI_CHANNEL_MONITOR: u16 = 2;
pub const HCI_CHANNEL_CONTROL: u16 = 3;
pub const HCI_CHANNEL_LOGGING: u16 = 4;

// ioctl numbers, all in the 'H' group
pub const HCI_IOC_MAGIC: u8 = b'H';
pub const HCIDEVUP: u8 = 201;
pub const HCIDEVDOWN: u8 = 202;
pub const HCIDEVRESET: u8 = 203;
pub const HCIGETDEVLIST: u8 = 210;
pub const HCIGETDEVINFO: u8 = 211;

// LMP feature bits, byte 4
pub const LMP_LE_OCTET: usize = 4;
pub const LMP_LE: u8 = 0x40;

pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 100;
