use std::sync::Arc;

use bit_vec::BitVec;
use bytes::BytesMut;
use log::debug;

use crate::error::{DbError, DbResult};
use crate::field::TupleDesc;
use crate::ids::{PageId, RecordId};
use crate::tuple::Tuple;

/// Fixed size, in bytes, of every page on disk.
pub const PAGE_SIZE: usize = 4096;

/// Number of fixed-size tuple slots a page of `desc`-shaped tuples holds:
/// `floor((PAGE_SIZE * 8) / (tuple_size * 8 + 1))`, the `+1` accounting for
/// each slot's header bit.
pub fn slots_per_page(desc: &TupleDesc) -> usize {
    let tuple_bits = desc.tuple_size() * 8 + 1;
    (PAGE_SIZE * 8) / tuple_bits
}

/// Header size in bytes: `ceil(slots / 8)`.
pub fn header_size(desc: &TupleDesc) -> usize {
    (slots_per_page(desc) + 7) / 8
}

/// A slotted page: a used-slot bitmap header followed by `N` fixed-size
/// tuple records. Serializes to exactly `PAGE_SIZE` bytes; unused trailing
/// bytes (inside both the header and any slot) are zero.
pub struct HeapPage {
    pid: PageId,
    desc: Arc<TupleDesc>,
    header: BitVec,
    slots: Vec<Option<Tuple>>,
    dirty: Option<crate::ids::TransactionId>,
    before_image: Vec<u8>,
}

impl HeapPage {
    /// A freshly allocated page: all slots empty, before-image is the
    /// zeroed page itself (an aborted transaction that allocated this page
    /// and never committed should see it vanish back to nothing, but
    /// NO-STEAL means the frame is simply discarded in that case, not
    /// reverted — `before_image` here exists for symmetry with
    /// `deserialize` and is only actually consulted on in-place edits).
    pub fn new_empty(pid: PageId, desc: Arc<TupleDesc>) -> HeapPage {
        let n = slots_per_page(&desc);
        let mut page = HeapPage {
            pid,
            desc,
            header: BitVec::from_elem(n, false),
            slots: vec![None; n],
            dirty: None,
            before_image: Vec::new(),
        };
        page.before_image = page.serialize();
        page
    }

    pub fn deserialize(bytes: &[u8], pid: PageId, desc: Arc<TupleDesc>) -> DbResult<HeapPage> {
        if bytes.len() != PAGE_SIZE {
            return Err(DbError::storage(format!(
                "page {:?}: expected {} bytes, got {}",
                pid,
                PAGE_SIZE,
                bytes.len()
            )));
        }

        let n = slots_per_page(&desc);
        let hsize = header_size(&desc);
        let header_bytes = &bytes[..hsize];
        debug!(
            "deserializing page {:?}, header bytes: {}",
            pid,
            hex::encode(header_bytes)
        );

        let mut header = BitVec::from_elem(n, false);
        for slot in 0..n {
            let used = (header_bytes[slot / 8] >> (slot % 8)) & 1 == 1;
            header.set(slot, used);
        }

        let tuple_size = desc.tuple_size();
        let mut slots = vec![None; n];
        let mut offset = hsize;
        for slot in 0..n {
            let chunk = &bytes[offset..offset + tuple_size];
            offset += tuple_size;
            if header[slot] {
                let mut tuple = Tuple::decode(desc.clone(), chunk)?;
                tuple.set_record_id(RecordId::new(pid, slot as i32));
                slots[slot] = Some(tuple);
            }
        }

        Ok(HeapPage {
            pid,
            desc,
            header,
            slots,
            dirty: None,
            before_image: bytes.to_vec(),
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let n = slots_per_page(&self.desc);
        let hsize = header_size(&self.desc);
        let tuple_size = self.desc.tuple_size();

        let mut buf = BytesMut::with_capacity(PAGE_SIZE);
        let mut header_bytes = vec![0u8; hsize];
        for slot in 0..n {
            if self.header[slot] {
                header_bytes[slot / 8] |= 1 << (slot % 8);
            }
        }
        buf.extend_from_slice(&header_bytes);

        for slot in &self.slots {
            match slot {
                Some(tuple) => buf.extend_from_slice(&tuple.encode()),
                None => buf.extend_from_slice(&vec![0u8; tuple_size]),
            }
        }

        debug_assert_eq!(buf.len(), PAGE_SIZE, "serialized page must be PAGE_SIZE bytes");
        buf.to_vec()
    }

    pub fn page_id(&self) -> PageId {
        self.pid
    }

    pub fn tuple_desc(&self) -> Arc<TupleDesc> {
        self.desc.clone()
    }

    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn num_empty_slots(&self) -> usize {
        self.slots.iter().filter(|t| t.is_none()).count()
    }

    /// Finds the first clear header bit, writes `tuple` there, and stamps
    /// its `record_id`. Not thread safe; the caller must already hold the
    /// page's write lock.
    pub fn insert_tuple(&mut self, mut tuple: Tuple) -> DbResult<()> {
        if tuple.tuple_desc().as_ref() != self.desc.as_ref() {
            return Err(DbError::illegal_argument(
                "tuple schema does not match page schema",
            ));
        }
        let slot = (0..self.header.len())
            .find(|&i| !self.header[i])
            .ok_or_else(|| DbError::storage(format!("page {:?} has no empty slots", self.pid)))?;

        tuple.set_record_id(RecordId::new(self.pid, slot as i32));
        self.header.set(slot, true);
        self.slots[slot] = Some(tuple);
        Ok(())
    }

    /// Fails unless `tuple.record_id` names a slot on this page that is
    /// occupied and whose content equals `tuple`.
    pub fn delete_tuple(&mut self, tuple: &Tuple) -> DbResult<()> {
        let rid = tuple
            .record_id()
            .ok_or_else(|| DbError::illegal_argument("tuple has no record id to delete by"))?;
        if rid.page_id != self.pid {
            return Err(DbError::illegal_argument(
                "tuple's record id does not belong to this page",
            ));
        }
        let slot = rid.slot as usize;
        if slot >= self.header.len() || !self.header[slot] {
            return Err(DbError::illegal_argument(format!(
                "slot {} is not occupied",
                slot
            )));
        }
        match &self.slots[slot] {
            Some(existing) if existing == tuple => {}
            _ => {
                return Err(DbError::illegal_argument(
                    "tuple content does not match the slot being deleted",
                ))
            }
        }
        self.header.set(slot, false);
        self.slots[slot] = None;
        Ok(())
    }

    pub fn mark_dirty(&mut self, dirty: bool, tid: crate::ids::TransactionId) {
        self.dirty = if dirty { Some(tid) } else { None };
    }

    pub fn is_dirty(&self) -> Option<crate::ids::TransactionId> {
        self.dirty
    }

    pub fn before_image(&self) -> Vec<u8> {
        self.before_image.clone()
    }

    /// Re-snapshots the before-image to the page's current content. Called
    /// once, right after a page is loaded into the buffer pool (spec
    /// defines the before-image as the bytes "at the instant it was first
    /// loaded"); never called again afterwards for that pin.
    pub fn set_before_image(&mut self) {
        self.before_image = self.serialize();
    }

    /// Occupied-slot tuples, in ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Tuple> {
        self.slots.iter().filter_map(|t| t.as_ref())
    }
}
