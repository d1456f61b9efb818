//! Compact binary encoding of the inverted index.
//!
//! Layout: a fixed header (`QIDX` magic, format version, crc32 of the
//! payload, payload length) followed by little-endian, length-prefixed
//! sections: the document registry in insertion order, the global index,
//! then each per-field index. The checksum and every length are verified
//! before any decoded state is produced, so a corrupt blob never yields a
//! half-built index.

use std::io::Cursor;
use std::sync::Arc;

use ahash::AHashMap;
use byteorder::{LittleEndian, ReadBytesExt};
use chrono::{DateTime, TimeZone, Utc};

use crate::analysis::Analyzer;
use crate::data::{Repo, SearchField};
use crate::error::{QuarryError, Result};

use super::inverted::{FieldIndex, InvertedIndex};
use super::posting::PostingList;

const MAGIC: &[u8; 4] = b"QIDX";
const FORMAT_VERSION: u8 = 1;

fn field_tag(field: SearchField) -> u8 {
    match field {
        SearchField::Name => 0,
        SearchField::Description => 1,
        SearchField::Owner => 2,
        SearchField::Language => 3,
        SearchField::Topics => 4,
    }
}

fn field_from_tag(tag: u8) -> Result<SearchField> {
    match tag {
        0 => Ok(SearchField::Name),
        1 => Ok(SearchField::Description),
        2 => Ok(SearchField::Owner),
        3 => Ok(SearchField::Language),
        4 => Ok(SearchField::Topics),
        other => Err(QuarryError::deserialization(format!(
            "unknown field tag {other}"
        ))),
    }
}

// --- encoding ---

fn put_u8(buf: &mut Vec<u8>, v: u8) {
    buf.push(v);
}

fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_u64(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_i64(buf: &mut Vec<u8>, v: i64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_string(buf: &mut Vec<u8>, s: &str) {
    put_u32(buf, s.len() as u32);
    buf.extend_from_slice(s.as_bytes());
}

fn put_opt_datetime(buf: &mut Vec<u8>, dt: &Option<DateTime<Utc>>) {
    match dt {
        Some(dt) => {
            put_u8(buf, 1);
            put_i64(buf, dt.timestamp_micros());
        }
        None => put_u8(buf, 0),
    }
}

fn put_repo(buf: &mut Vec<u8>, repo: &Repo) {
    put_u64(buf, repo.id);
    put_string(buf, &repo.name);
    put_string(buf, &repo.description);
    put_string(buf, &repo.owner);
    match &repo.language {
        Some(language) => {
            put_u8(buf, 1);
            put_string(buf, language);
        }
        None => put_u8(buf, 0),
    }
    put_u32(buf, repo.topics.len() as u32);
    for topic in &repo.topics {
        put_string(buf, topic);
    }
    put_u64(buf, repo.stars);
    put_u64(buf, repo.forks);
    put_u64(buf, repo.watchers);
    put_opt_datetime(buf, &repo.created_at);
    put_opt_datetime(buf, &repo.updated_at);
    put_opt_datetime(buf, &repo.pushed_at);
    put_u8(buf, repo.archived as u8);
    put_u8(buf, repo.fork as u8);
}

fn put_field_index(buf: &mut Vec<u8>, index: &FieldIndex) {
    let terms = index.sorted_terms();
    put_u32(buf, terms.len() as u32);
    for term in &terms {
        let list = index
            .postings(term)
            .expect("sorted_terms only yields indexed terms");
        put_string(buf, term);
        put_u32(buf, list.postings.len() as u32);
        for posting in &list.postings {
            put_u64(buf, posting.doc_id);
            put_u32(buf, posting.term_frequency);
            put_u32(buf, posting.positions.len() as u32);
            for position in &posting.positions {
                put_u32(buf, *position);
            }
        }
    }
}

/// Encode the full index into a self-describing blob.
pub fn encode(index: &InvertedIndex) -> Vec<u8> {
    let mut payload = Vec::new();

    let order = index.doc_order();
    put_u32(&mut payload, order.len() as u32);
    for doc_id in order {
        let repo = index
            .doc(*doc_id)
            .expect("doc_order only references registered documents");
        put_repo(&mut payload, repo);
    }

    put_field_index(&mut payload, index.global_index());
    put_u8(&mut payload, SearchField::ALL.len() as u8);
    for field in SearchField::ALL {
        put_u8(&mut payload, field_tag(field));
        put_field_index(&mut payload, index.field_index(field));
    }

    let checksum = crc32fast::hash(&payload);

    let mut out = Vec::with_capacity(payload.len() + 17);
    out.extend_from_slice(MAGIC);
    put_u8(&mut out, FORMAT_VERSION);
    put_u32(&mut out, checksum);
    put_u64(&mut out, payload.len() as u64);
    out.extend_from_slice(&payload);
    out
}

// --- decoding ---

struct Reader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Reader {
            cursor: Cursor::new(bytes),
        }
    }

    fn remaining(&self) -> u64 {
        self.cursor.get_ref().len() as u64 - self.cursor.position()
    }

    fn u8(&mut self) -> Result<u8> {
        self.cursor
            .read_u8()
            .map_err(|_| QuarryError::deserialization("unexpected end of blob"))
    }

    fn u32(&mut self) -> Result<u32> {
        self.cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| QuarryError::deserialization("unexpected end of blob"))
    }

    fn u64(&mut self) -> Result<u64> {
        self.cursor
            .read_u64::<LittleEndian>()
            .map_err(|_| QuarryError::deserialization("unexpected end of blob"))
    }

    fn i64(&mut self) -> Result<i64> {
        self.cursor
            .read_i64::<LittleEndian>()
            .map_err(|_| QuarryError::deserialization("unexpected end of blob"))
    }

    fn string(&mut self) -> Result<String> {
        let len = self.u32()? as u64;
        if len > self.remaining() {
            return Err(QuarryError::deserialization(
                "string length exceeds remaining blob size",
            ));
        }
        let start = self.cursor.position() as usize;
        let end = start + len as usize;
        let bytes = &self.cursor.get_ref()[start..end];
        let s = std::str::from_utf8(bytes)
            .map_err(|_| QuarryError::deserialization("invalid utf-8 in blob"))?
            .to_string();
        self.cursor.set_position(end as u64);
        Ok(s)
    }

    fn opt_datetime(&mut self) -> Result<Option<DateTime<Utc>>> {
        match self.u8()? {
            0 => Ok(None),
            1 => {
                let micros = self.i64()?;
                Utc.timestamp_micros(micros)
                    .single()
                    .map(Some)
                    .ok_or_else(|| QuarryError::deserialization("timestamp out of range"))
            }
            other => Err(QuarryError::deserialization(format!(
                "invalid option flag {other}"
            ))),
        }
    }

    fn repo(&mut self) -> Result<Repo> {
        let id = self.u64()?;
        let name = self.string()?;
        let description = self.string()?;
        let owner = self.string()?;
        let language = match self.u8()? {
            0 => None,
            1 => Some(self.string()?),
            other => {
                return Err(QuarryError::deserialization(format!(
                    "invalid option flag {other}"
                )));
            }
        };
        let topic_count = self.u32()?;
        if topic_count as u64 > self.remaining() {
            return Err(QuarryError::deserialization("topic count exceeds blob size"));
        }
        let mut topics = Vec::with_capacity(topic_count as usize);
        for _ in 0..topic_count {
            topics.push(self.string()?);
        }
        let stars = self.u64()?;
        let forks = self.u64()?;
        let watchers = self.u64()?;
        let created_at = self.opt_datetime()?;
        let updated_at = self.opt_datetime()?;
        let pushed_at = self.opt_datetime()?;
        let archived = self.u8()? != 0;
        let fork = self.u8()? != 0;

        Ok(Repo {
            id,
            name,
            description,
            owner,
            language,
            topics,
            stars,
            forks,
            watchers,
            created_at,
            updated_at,
            pushed_at,
            archived,
            fork,
        })
    }

    fn field_index(&mut self) -> Result<FieldIndex> {
        let term_count = self.u32()?;
        if term_count as u64 > self.remaining() {
            return Err(QuarryError::deserialization("term count exceeds blob size"));
        }
        let mut index = FieldIndex::default();
        for _ in 0..term_count {
            let term = self.string()?;
            let posting_count = self.u32()?;
            if posting_count as u64 * 16 > self.remaining() {
                return Err(QuarryError::deserialization(
                    "posting count exceeds blob size",
                ));
            }
            let mut list = PostingList::default();
            for _ in 0..posting_count {
                let doc_id = self.u64()?;
                let term_frequency = self.u32()?;
                let position_count = self.u32()?;
                if position_count as u64 * 4 > self.remaining() {
                    return Err(QuarryError::deserialization(
                        "position count exceeds blob size",
                    ));
                }
                let mut positions = Vec::with_capacity(position_count as usize);
                for _ in 0..position_count {
                    positions.push(self.u32()?);
                }
                list.postings.push(super::posting::Posting {
                    doc_id,
                    term_frequency,
                    positions,
                });
            }
            index.insert_list(term, list);
        }
        Ok(index)
    }
}

/// Decode a blob produced by [`encode`], verifying header, checksum and all
/// section bounds before constructing the index.
pub fn decode(
    bytes: &[u8],
    analyzer: Arc<Analyzer>,
    max_documents: usize,
) -> Result<InvertedIndex> {
    if bytes.len() < 17 {
        return Err(QuarryError::deserialization("blob too short"));
    }
    if &bytes[..4] != MAGIC {
        return Err(QuarryError::deserialization("bad magic"));
    }
    let version = bytes[4];
    if version != FORMAT_VERSION {
        return Err(QuarryError::deserialization(format!(
            "unsupported format version {version}"
        )));
    }
    let checksum = u32::from_le_bytes([bytes[5], bytes[6], bytes[7], bytes[8]]);
    let payload_len = u64::from_le_bytes([
        bytes[9], bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15], bytes[16],
    ]);
    let payload = &bytes[17..];
    if payload.len() as u64 != payload_len {
        return Err(QuarryError::deserialization("payload length mismatch"));
    }
    if crc32fast::hash(payload) != checksum {
        return Err(QuarryError::deserialization("checksum mismatch"));
    }

    let mut reader = Reader::new(payload);

    let doc_count = reader.u32()?;
    let mut docs = AHashMap::new();
    let mut doc_order = Vec::with_capacity(doc_count as usize);
    for _ in 0..doc_count {
        let repo = reader.repo()?;
        doc_order.push(repo.id);
        docs.insert(repo.id, repo);
    }

    let global = reader.field_index()?;

    let field_count = reader.u8()?;
    if field_count as usize != SearchField::ALL.len() {
        return Err(QuarryError::deserialization(format!(
            "expected {} field indices, found {field_count}",
            SearchField::ALL.len()
        )));
    }
    let mut fields = AHashMap::new();
    for _ in 0..field_count {
        let field = field_from_tag(reader.u8()?)?;
        let index = reader.field_index()?;
        if fields.insert(field, index).is_some() {
            return Err(QuarryError::deserialization(format!(
                "duplicate field index for {field}"
            )));
        }
    }

    if reader.remaining() != 0 {
        return Err(QuarryError::deserialization("trailing bytes after payload"));
    }

    InvertedIndex::from_parts(analyzer, global, fields, docs, doc_order, max_documents)
}
