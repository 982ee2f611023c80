//! Driver behavior tests against a scripted transport double.
//!
//! The mock records every transport call, so these tests can assert not just
//! what `poll()` returns but which USB operations it performed (and, for the
//! unimplemented commands, that none happened at all).

use k8055_usb::consts::{cmd, EP_IN, EP_OUT, K8055_PID, PACKET_LEN, VELLEMAN_VID};
use k8055_usb::{Error, K8055, Result, UsbTransport};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Open {
        vendor_id: u16,
        product_id: u16,
        index: usize,
    },
    Write {
        endpoint: u8,
        data: Vec<u8>,
    },
    Read {
        endpoint: u8,
    },
    Close,
}

enum OpenOutcome {
    Opened,
    NotFound,
    Fail,
}

enum WriteOutcome {
    Ok,
    Fail,
}

enum ReadOutcome {
    Packet([u8; PACKET_LEN]),
    Short(usize),
    Fail,
}

#[derive(Default)]
struct MockState {
    open: bool,
    calls: Vec<Call>,
    open_script: VecDeque<OpenOutcome>,
    write_script: VecDeque<WriteOutcome>,
    read_script: VecDeque<ReadOutcome>,
}

/// Scripted [`UsbTransport`]. Unscripted calls succeed: `open` finds the
/// device, `write` accepts everything, `read` returns an all-zero packet.
#[derive(Clone, Default)]
struct MockTransport(Rc<RefCell<MockState>>);

impl MockTransport {
    fn new() -> Self {
        Self::default()
    }

    fn script_open(&self, outcome: OpenOutcome) {
        self.0.borrow_mut().open_script.push_back(outcome);
    }

    fn script_write(&self, outcome: WriteOutcome) {
        self.0.borrow_mut().write_script.push_back(outcome);
    }

    fn script_read(&self, outcome: ReadOutcome) {
        self.0.borrow_mut().read_script.push_back(outcome);
    }

    fn calls(&self) -> Vec<Call> {
        self.0.borrow().calls.clone()
    }

    fn written_packets(&self) -> Vec<Vec<u8>> {
        self.0
            .borrow()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Write { data, .. } => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    fn count_open_calls(&self) -> usize {
        self.0
            .borrow()
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Open { .. }))
            .count()
    }
}

impl UsbTransport for MockTransport {
    fn open(&mut self, vendor_id: u16, product_id: u16, index: usize) -> Result<bool> {
        let mut state = self.0.borrow_mut();
        state.calls.push(Call::Open {
            vendor_id,
            product_id,
            index,
        });
        if state.open {
            return Ok(true);
        }
        match state.open_script.pop_front().unwrap_or(OpenOutcome::Opened) {
            OpenOutcome::Opened => {
                state.open = true;
                Ok(true)
            }
            OpenOutcome::NotFound => Ok(false),
            OpenOutcome::Fail => Err(libusb::Error::Io.into()),
        }
    }

    fn is_open(&self) -> bool {
        self.0.borrow().open
    }

    fn write_interrupt(&mut self, endpoint: u8, data: &[u8], _timeout: Duration) -> Result<usize> {
        let mut state = self.0.borrow_mut();
        state.calls.push(Call::Write {
            endpoint,
            data: data.to_vec(),
        });
        match state.write_script.pop_front().unwrap_or(WriteOutcome::Ok) {
            WriteOutcome::Ok => Ok(data.len()),
            WriteOutcome::Fail => Err(libusb::Error::Pipe.into()),
        }
    }

    fn read_interrupt(&mut self, endpoint: u8, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        let mut state = self.0.borrow_mut();
        state.calls.push(Call::Read { endpoint });
        match state
            .read_script
            .pop_front()
            .unwrap_or(ReadOutcome::Packet([0; PACKET_LEN]))
        {
            ReadOutcome::Packet(packet) => {
                buf[..PACKET_LEN].copy_from_slice(&packet);
                Ok(PACKET_LEN)
            }
            ReadOutcome::Short(n) => Ok(n),
            ReadOutcome::Fail => Err(libusb::Error::Pipe.into()),
        }
    }

    fn close(&mut self) {
        let mut state = self.0.borrow_mut();
        state.calls.push(Call::Close);
        state.open = false;
    }
}

fn board() -> (K8055<MockTransport>, MockTransport) {
    let mock = MockTransport::new();
    (K8055::with_transport(mock.clone(), 0), mock)
}

#[test]
fn poll_connects_writes_and_reads() {
    let (mut board, mock) = board();
    mock.script_read(ReadOutcome::Packet([
        0x11, 0x02, 0x80, 0x40, 0x01, 0x02, 0x00, 0x0A,
    ]));

    assert!(board.poll());

    assert_eq!(
        mock.calls(),
        vec![
            Call::Open {
                vendor_id: VELLEMAN_VID,
                product_id: K8055_PID,
                index: 0,
            },
            Call::Write {
                endpoint: EP_OUT,
                data: vec![cmd::SET_ANALOG_DIGITAL, 0, 0, 0, 0, 0, 0, 0],
            },
            Call::Read { endpoint: EP_IN },
        ]
    );

    assert_eq!(board.digital_input_byte(), 0x11);
    assert_eq!(board.status(), 0x02);
    assert_eq!(board.analog_input1(), 128);
    assert_eq!(board.analog_input2(), 64);
    // Counter accessors mask to the low 8 bits of the decoded 16-bit value.
    assert_eq!(board.counter1(), 0x02);
    assert_eq!(board.counter2(), 0x0A);
}

#[test]
fn poll_skips_lookup_while_connected() {
    let (mut board, mock) = board();
    assert!(board.poll());
    assert!(board.poll());
    assert_eq!(mock.count_open_calls(), 1);
}

#[test]
fn outputs_are_cached_and_sent_on_next_poll() {
    let (mut board, mock) = board();
    board.set_digital_output(1, true).unwrap();
    board.set_digital_output(3, true).unwrap();
    board.set_analog_output1(10);
    board.set_analog_output2(200);

    assert!(board.poll());
    assert_eq!(mock.written_packets(), vec![vec![5, 5, 10, 200, 0, 0, 0, 0]]);

    // Output state persists across polls until changed.
    board.set_digital_output(1, false).unwrap();
    assert!(board.poll());
    assert_eq!(
        mock.written_packets()[1],
        vec![5, 0b0000_0100, 10, 200, 0, 0, 0, 0]
    );
}

#[test]
fn set_digital_output_touches_only_its_own_bit() {
    let (mut board, _mock) = board();
    for port in 1..=8u8 {
        board.set_digital_output(port, true).unwrap();
    }
    assert_eq!(board.digital_output_byte(), 0xFF);
    for port in 1..=8u8 {
        board.set_digital_output(port, false).unwrap();
        assert_eq!(board.digital_output_byte(), 0xFFu8 & !(1 << (port - 1)));
        board.set_digital_output(port, true).unwrap();
        assert_eq!(board.digital_output_byte(), 0xFF);
    }
}

#[test]
fn digital_input_uses_the_scattered_bit_map() {
    // (port, bit in the status packet's input byte)
    let map = [(1u8, 4u8), (2, 5), (3, 0), (4, 6), (5, 7)];
    for (port, bit) in map {
        let (mut board, mock) = board();
        let mut packet = [0u8; PACKET_LEN];
        packet[0] = 1 << bit;
        mock.script_read(ReadOutcome::Packet(packet));
        assert!(board.poll());

        for (other_port, _) in map {
            assert_eq!(
                board.digital_input(other_port).unwrap(),
                other_port == port,
                "bit {bit} set: input {other_port} vs input {port}"
            );
        }
    }
}

#[test]
fn out_of_range_ports_are_rejected() {
    let (mut board, mock) = board();
    for port in [0u8, 6, 9, 255] {
        assert!(matches!(
            board.digital_input(port),
            Err(Error::PortOutOfRange { port: p, .. }) if p == port
        ));
    }
    for port in [0u8, 9, 255] {
        assert!(matches!(
            board.set_digital_output(port, true),
            Err(Error::PortOutOfRange { port: p, .. }) if p == port
        ));
    }
    // Contract violations are local; nothing was sent to the transport.
    assert!(mock.calls().is_empty());
}

#[test]
fn poll_returns_false_while_board_is_absent() {
    let (mut board, mock) = board();
    mock.script_open(OpenOutcome::NotFound);
    mock.script_open(OpenOutcome::Fail);

    assert!(!board.poll());
    assert!(!board.poll());
    // Lookup failures never reach the endpoints.
    assert_eq!(mock.count_open_calls(), 2);
    assert!(!mock
        .calls()
        .iter()
        .any(|c| matches!(c, Call::Write { .. } | Call::Read { .. })));

    // The board shows up on the third attempt.
    assert!(board.poll());
}

#[test]
fn write_failure_closes_the_handle() {
    let (mut board, mock) = board();
    mock.script_write(WriteOutcome::Fail);

    assert!(!board.poll());
    assert!(!mock.is_open());
    assert_eq!(mock.calls().last(), Some(&Call::Close));

    // Next poll reconnects from scratch.
    assert!(board.poll());
    assert_eq!(mock.count_open_calls(), 2);
}

#[test]
fn short_read_closes_the_handle_and_keeps_cache() {
    let (mut board, mock) = board();
    mock.script_read(ReadOutcome::Packet([
        0x11, 0x02, 0x80, 0x40, 0x01, 0x02, 0x00, 0x0A,
    ]));
    assert!(board.poll());

    mock.script_read(ReadOutcome::Short(7));
    assert!(!board.poll());
    assert!(!mock.is_open());
    assert_eq!(mock.calls().last(), Some(&Call::Close));

    // Stale values from the last successful read stay observable.
    assert_eq!(board.digital_input_byte(), 0x11);
    assert_eq!(board.analog_input1(), 128);
    assert_eq!(board.counter2(), 0x0A);
}

#[test]
fn read_error_leaves_cache_stale() {
    let (mut board, mock) = board();
    mock.script_read(ReadOutcome::Packet([
        0x01, 0x01, 0x55, 0xAA, 0x00, 0x07, 0x00, 0x09,
    ]));
    assert!(board.poll());

    mock.script_read(ReadOutcome::Fail);
    assert!(!board.poll());

    assert_eq!(board.digital_input_byte(), 0x01);
    assert_eq!(board.analog_input2(), 0xAA);
    assert_eq!(board.counter1(), 0x07);
}

#[test]
fn unimplemented_commands_fail_without_io() {
    let (mut board, mock) = board();
    let results = [
        board.command_reset(),
        board.command_set_debounce_counter1(),
        board.command_set_debounce_counter2(),
        board.command_reset_counter1(),
        board.command_reset_counter2(),
    ];
    for result in results {
        assert!(matches!(result, Err(Error::NotImplemented(_))));
    }
    assert!(mock.calls().is_empty());
}

#[test]
fn timeouts_default_and_roundtrip() {
    let (mut board, _mock) = board();
    assert_eq!(board.read_timeout(), Duration::from_millis(1000));
    assert_eq!(board.write_timeout(), Duration::from_millis(1000));

    board.set_read_timeout(Duration::ZERO);
    board.set_write_timeout(Duration::from_millis(250));
    assert_eq!(board.read_timeout(), Duration::ZERO);
    assert_eq!(board.write_timeout(), Duration::from_millis(250));
}
