// Lists the local controllers, claims one and sends it an HCI Reset, printing the raw reply.
//
// Needs CAP_NET_ADMIN (or root). Pass a controller index to claim that one only:
//
//     RUST_LOG=debug cargo run --example open_controller -- 0

use std::env;

use anyhow::Context;

use btleplug_hci::api::DeviceSelector;
use btleplug_hci::platform::{BytePool, Manager};

const HCI_RESET: [u8; 4] = [0x01, 0x03, 0x0c, 0x00];

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let selector = match env::args().nth(1) {
        Some(arg) => DeviceSelector::Index(arg.parse().context("controller index")?),
        None => DeviceSelector::Any,
    };

    let manager = Manager::new();
    let controllers = manager.controllers()?;
    if controllers.is_empty() {
        eprintln!("Bluetooth controller(s) were NOT found, sorry...");
        return Ok(());
    }
    for info in &controllers {
        println!(
            "hci{}: {} {} {:?} le={} up={}",
            info.index,
            info.name,
            info.address,
            info.typ,
            info.supports_le(),
            info.is_up()
        );
    }

    let device = manager.open_controller(selector, true)?;
    println!("claimed {:?}", device);

    device.write(&HCI_RESET)?;

    let pool = BytePool::new(4096, 8);
    for _ in 0..10 {
        let mut buf = pool.get();
        let n = device.read(&mut buf)?;
        if n > 0 {
            println!("< {:02x?}", &buf[..n]);
            pool.put(buf);
            break;
        }
        pool.put(buf);
    }

    pool.shutdown();
    device.close()?;
    Ok(())
}
