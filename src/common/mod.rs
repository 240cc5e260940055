// btleplug Source Code File
//
// Copyright 2020 Nonpolynomial Labs LLC. All rights reserved.
//
// Licensed under the BSD 3-Clause license. See LICENSE file in the project root
// for full license information.

//! Functionality shared by the manager, the devices it opens and the protocol layers above them.

pub mod logger;
pub mod pool;
