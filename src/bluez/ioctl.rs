// btleplug Source Code File
//
// Copyright 2020 Nonpolynomial Labs LLC. All rights reserved.
//
// Licensed under the BSD 3-Clause license. See LICENSE file in the project root
// for full license information.

use std::mem;

use nix::{ioctl_read_bad, ioctl_write_int, request_code_read};

use crate::bluez::socket::{HCIDevInfo, HCIDevListReq};
use crate::constants::*;

// #define HCIDEVUP	_IOW('H', 201, int)
ioctl_write_int!(hci_dev_up, HCI_IOC_MAGIC, HCIDEVUP);
// #define HCIDEVDOWN	_IOW('H', 202, int)
ioctl_write_int!(hci_dev_down, HCI_IOC_MAGIC, HCIDEVDOWN);
// #define HCIDEVRESET	_IOW('H', 203, int)
ioctl_write_int!(hci_dev_reset, HCI_IOC_MAGIC, HCIDEVRESET);

// The kernel declares these as reading an int but copies whole structs.
// #define HCIGETDEVLIST	_IOR('H', 210, int)
ioctl_read_bad!(
    hci_get_dev_list,
    request_code_read!(HCI_IOC_MAGIC, HCIGETDEVLIST, mem::size_of::<libc::c_int>()),
    HCIDevListReq
);
// #define HCIGETDEVINFO	_IOR('H', 211, int)
ioctl_read_bad!(
    hci_get_dev_info,
    request_code_read!(HCI_IOC_MAGIC, HCIGETDEVINFO, mem::size_of::<libc::c_int>()),
    HCIDevInfo
);
