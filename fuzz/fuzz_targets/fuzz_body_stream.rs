#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shiguredo_body_stream::{
    Action, BodyStreamLimits, BodyStreamState, Error, Event, Phase,
};

#[derive(Arbitrary, Debug)]
enum FuzzEvent {
    BytesArrived(Vec<u8>),
    ReadRequested,
    WriteCompleted,
    End,
    ReadError,
    WriteError,
    Cancelled,
}

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    max_buffered_chunks: u8,
    max_buffered_bytes: u16,
    events: Vec<FuzzEvent>,
}

fuzz_target!(|input: FuzzInput| {
    let limits = BodyStreamLimits {
        max_buffered_chunks: input.max_buffered_chunks as usize,
        max_buffered_bytes: input.max_buffered_bytes as usize,
    };
    let mut state = BodyStreamState::with_limits(limits.clone());
    let mut closes = 0;
    let mut write_pending = false;

    for event in input.events {
        let event = match event {
            FuzzEvent::BytesArrived(data) => Event::BytesArrived(data),
            FuzzEvent::ReadRequested => Event::ReadRequested,
            FuzzEvent::WriteCompleted => Event::WriteCompleted,
            FuzzEvent::End => Event::End,
            FuzzEvent::ReadError => Event::Error(Error::Read("fuzz".to_string())),
            FuzzEvent::WriteError => Event::Error(Error::Write("fuzz".to_string())),
            FuzzEvent::Cancelled => Event::Error(Error::Cancelled),
        };
        let is_write_completed = matches!(event, Event::WriteCompleted);

        let step = state.handle(event);

        match step.action {
            Action::Write(_) => {
                // 書き込みは同時に 1 つまで
                assert!(!write_pending || is_write_completed);
                write_pending = true;
            }
            Action::Close(_) => {
                closes += 1;
                write_pending = false;
            }
            Action::Nothing => {
                if is_write_completed {
                    write_pending = false;
                }
            }
        }

        // クローズは 1 回だけ
        assert!(closes <= 1);
        assert_eq!(state.is_closed(), closes == 1);
        if state.is_closed() {
            assert_eq!(state.phase(), Phase::Closed);
        }

        // バッファは制限を超えない
        assert!(state.buffered_len() <= limits.max_buffered_chunks);
        assert!(state.buffered_bytes() <= limits.max_buffered_bytes);
    }
});
