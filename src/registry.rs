use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use evm_frame_core::Operation;

type Table = [Option<Arc<dyn Operation>>; 256];

/// Opcode to operation mapping, one 256-entry table per code version.
///
/// Built once per protocol configuration and only read afterwards.
#[derive(Default)]
pub struct OperationRegistry {
	tables: BTreeMap<u32, Box<Table>>,
}

impl OperationRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Operation mapped for `opcode` under `version`, if any.
	pub fn get(&self, opcode: u8, version: u32) -> Option<&Arc<dyn Operation>> {
		self.tables
			.get(&version)
			.and_then(|table| table[opcode as usize].as_ref())
	}

	pub fn get_or_default<'a>(
		&'a self,
		opcode: u8,
		version: u32,
		default: &'a Arc<dyn Operation>,
	) -> &'a Arc<dyn Operation> {
		self.get(opcode, version).unwrap_or(default)
	}

	/// Map `operation` under its own opcode, replacing what was there.
	pub fn put(&mut self, operation: Arc<dyn Operation>, version: u32) {
		let table = self
			.tables
			.entry(version)
			.or_insert_with(|| Box::new(core::array::from_fn(|_| None)));
		let index = operation.opcode().as_usize();
		table[index] = Some(operation);
	}

	/// Code versions with at least one operation.
	pub fn versions(&self) -> impl Iterator<Item = u32> + '_ {
		self.tables.keys().copied()
	}
}

impl core::fmt::Debug for OperationRegistry {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		let mut list = f.debug_map();
		for (version, table) in &self.tables {
			list.entry(version, &table.iter().filter(|op| op.is_some()).count());
		}
		list.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::operations::InvalidOperation;
	use crate::Config;
	use evm_frame_core::{Opcode, DEFAULT_VERSION};

	#[test]
	fn lookup_is_scoped_by_version() {
		let registry = Config::istanbul().operation_registry();
		let add = registry.get(Opcode::ADD.as_u8(), DEFAULT_VERSION).unwrap();
		assert_eq!(add.name(), "ADD");
		assert!(alloc::format!("{:?}", add).contains("\"ADD\""));
		assert!(registry.get(Opcode::ADD.as_u8(), 1).is_none());
		assert!(registry.get(0x0c, DEFAULT_VERSION).is_none());
	}

	#[test]
	fn unmapped_opcode_falls_back_to_default() {
		let registry = OperationRegistry::new();
		let invalid: Arc<dyn Operation> = Arc::new(InvalidOperation);
		let op = registry.get_or_default(0x0c, DEFAULT_VERSION, &invalid);
		assert!(Arc::ptr_eq(op, &invalid));
	}

	#[test]
	fn put_replaces_existing_entry() {
		let mut registry = OperationRegistry::new();
		registry.put(Arc::new(InvalidOperation), 3);
		let first = registry.get(Opcode::INVALID.as_u8(), 3).unwrap().clone();
		registry.put(Arc::new(InvalidOperation), 3);
		let second = registry.get(Opcode::INVALID.as_u8(), 3).unwrap();
		assert!(!Arc::ptr_eq(&first, second));
		assert_eq!(registry.versions().collect::<alloc::vec::Vec<_>>(), vec![3]);
	}
}
