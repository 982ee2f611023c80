//! Reference poll loop: mirror the digital inputs onto the digital outputs
//! and print input changes. Sleeps and retries when the board is absent, so
//! it can be started before the board is plugged in.

use k8055_usb::{K8055, Result};
use std::{thread, time::Duration};

fn main() -> Result<()> {
    env_logger::init();
    let context = libusb::Context::new()?;
    let mut board = K8055::new(&context);

    println!("Polling first K8055 board (Ctrl+C to stop)...");
    let mut last_inputs = None;
    loop {
        if !board.poll() {
            thread::sleep(Duration::from_millis(1000));
            continue;
        }

        let inputs = board.digital_input_byte();
        if last_inputs != Some(inputs) {
            last_inputs = Some(inputs);
            let ports: String = (1..=5u8)
                .rev()
                .map(|p| if board.digital_input(p).unwrap() { '1' } else { '0' })
                .collect();
            println!(
                "inputs {ports} (raw {inputs:08b}), analog {}/{}, counters {}/{}",
                board.analog_input1(),
                board.analog_input2(),
                board.counter1(),
                board.counter2()
            );
            // Echo the five inputs onto outputs 1-5.
            for port in 1..=5u8 {
                board.set_digital_output(port, board.digital_input(port)?)?;
            }
        }
    }
}
