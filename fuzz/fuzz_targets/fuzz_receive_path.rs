#![no_main]

use libfuzzer_sys::fuzz_target;
use rfm69_transport::{simulated_transport, DriverVariant, Transport, TransportConfig};

// Each input byte is one step: inject a frame, receive, send or change power
fuzz_target!(|data: &[u8]| {
    let Some((&first, steps)) = data.split_first() else {
        return;
    };
    let config = TransportConfig {
        variant: if first & 1 == 0 {
            DriverVariant::Buffered
        } else {
            DriverVariant::Polling
        },
        rx_buffer_size: usize::from(first >> 4) + 1,
        ..TransportConfig::default()
    };
    let Ok((mut transport, air)) = simulated_transport(config) else {
        return;
    };
    if !transport.init() {
        return;
    }

    let mut buf = [0u8; 64];
    for (i, &step) in steps.iter().enumerate() {
        let payload = &steps[i..steps.len().min(i + usize::from(step % 40))];
        match step % 8 {
            0 | 1 | 2 => {
                air.inject(payload, step & 0x40 != 0, -i16::from(step));
            }
            3 => {
                let len = transport.receive(&mut buf[..usize::from(step % 64)]);
                assert!(len <= 32);
            }
            4 => {
                transport.send(step, payload, step & 0x80 != 0);
            }
            5 => {
                transport.available();
            }
            6 => {
                transport.sleep();
            }
            _ => {
                transport.power_up();
                transport.resume();
            }
        }
    }
});
