#![cfg(feature = "tracing")]

use evm_frame::backend::{MemoryBackend, OverlayedBackend};
use evm_frame::tracing::{self, Event, EventListener};
use evm_frame::{Code, Config, Evm, ExceptionalHaltReason, Gas, MessageFrame, NoTracer, Opcode};

#[derive(Default)]
struct Recorder {
	opcodes: Vec<Opcode>,
	halts: Vec<(usize, ExceptionalHaltReason)>,
}

impl EventListener for Recorder {
	fn event(&mut self, event: Event) {
		match event {
			Event::Step { opcode, .. } => self.opcodes.push(opcode),
			Event::Halt { pc, reason, .. } => self.halts.push((pc, reason)),
		}
	}
}

#[test]
fn listener_sees_steps_and_halt() {
	let evm = Evm::new(&Config::istanbul());
	let mut host = OverlayedBackend::new(MemoryBackend::default());
	// PUSH1 0x01 POP POP
	let mut frame = MessageFrame::builder()
		.code(Code::from_bytes(hex::decode("60015050").unwrap()))
		.initial_gas(Gas::new(100))
		.build();

	let mut recorder = Recorder::default();
	let result = tracing::using(&mut recorder, || {
		evm.run_to_halt(&mut frame, &mut host, &mut NoTracer)
	});

	assert!(result.is_err());
	assert_eq!(recorder.opcodes, vec![Opcode::PUSH1, Opcode::POP, Opcode::POP]);
	assert_eq!(recorder.halts, vec![(3, ExceptionalHaltReason::InsufficientStackItems)]);
}
