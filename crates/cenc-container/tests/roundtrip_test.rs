//! End-to-end write/read coverage for the sealed container: on-disk layout,
//! boundary payload sizes, random access and property-based round-trips.

use std::path::PathBuf;
use std::sync::Arc;

use proptest::prelude::*;
use tempfile::TempDir;

use cenc_container::{
    inspect, ChunkedReadChannel, ChunkedWriteChannel, ReadOutcome, HEADER_SIZE,
};
use cenc_crypto::Keyset;

const AEAD_OVERHEAD: usize = 12 + 16;

fn keyset() -> Arc<Keyset> {
    Arc::new(Keyset::generate())
}

fn seal_to_disk(
    tmp: &TempDir,
    name: &str,
    chunk_size: u32,
    payload: &[u8],
    ks: &Arc<Keyset>,
) -> PathBuf {
    let path = tmp.path().join(name);
    let mut chan = ChunkedWriteChannel::create(&path, name, ks.clone(), chunk_size).unwrap();
    chan.write(payload).unwrap();
    chan.close().unwrap();
    path
}

fn read_all(chan: &mut ChunkedReadChannel) -> Vec<u8> {
    let mut out = Vec::new();
    let mut buf = [0u8; 33]; // odd size on purpose, to cross chunk boundaries
    loop {
        match chan.read(&mut buf).unwrap() {
            ReadOutcome::Data(n) => {
                assert!(n > 0, "read must never hand back zero bytes before EOF");
                out.extend_from_slice(&buf[..n]);
            }
            ReadOutcome::Eof => return out,
        }
    }
}

#[test]
fn empty_payload_writes_bare_header() {
    let tmp = TempDir::new().unwrap();
    let ks = keyset();
    let path = seal_to_disk(&tmp, "empty.dat", 64, b"", &ks);

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 32);
    assert_eq!(&bytes[0..4], b"CENC");
    assert_eq!(&bytes[10..18], &[0u8; 8]);

    let mut chan = ChunkedReadChannel::open(&path, "empty.dat", ks).unwrap();
    assert_eq!(chan.size(), 0);
    let mut buf = [0u8; 8];
    assert_eq!(chan.read(&mut buf).unwrap(), ReadOutcome::Eof);
}

#[test]
fn single_small_chunk_layout_and_aad() {
    let tmp = TempDir::new().unwrap();
    let ks = keyset();
    let path = seal_to_disk(&tmp, "greeting.txt", 64, b"hello world", &ks);

    let bytes = std::fs::read(&path).unwrap();
    let header = inspect(&path).unwrap();
    assert_eq!(header.chunk_size, 64);
    assert_eq!(header.original_size, 11);

    // One record: length prefix, then an 11-byte payload sealed with the
    // positional AAD
    let sealed_len = u32::from_be_bytes(bytes[32..36].try_into().unwrap()) as usize;
    assert_eq!(sealed_len, 11 + AEAD_OVERHEAD);
    let sealed = &bytes[36..36 + sealed_len];
    let opened = ks.open(sealed, b"greeting.txt:chunk:0").unwrap();
    assert_eq!(opened, b"hello world");

    let mut chan = ChunkedReadChannel::open(&path, "greeting.txt", ks).unwrap();
    assert_eq!(read_all(&mut chan), b"hello world");
}

#[test]
fn exact_chunk_multiple() {
    let tmp = TempDir::new().unwrap();
    let ks = keyset();
    let payload: Vec<u8> = (0x00u8..0x30).collect();
    let path = seal_to_disk(&tmp, "three.dat", 16, &payload, &ks);

    let header = inspect(&path).unwrap();
    assert_eq!(header.total_chunks(), 3);
    assert_eq!(header.last_chunk_len(), 16);

    let mut chan = ChunkedReadChannel::open(&path, "three.dat", ks).unwrap();
    chan.set_position(16).unwrap();
    let mut buf = [0u8; 16];
    assert_eq!(chan.read(&mut buf).unwrap(), ReadOutcome::Data(16));
    assert_eq!(&buf, &payload[16..32]);
}

#[test]
fn off_boundary_random_access() {
    let tmp = TempDir::new().unwrap();
    let ks = keyset();
    let payload: Vec<u8> = (0u8..40).collect();
    let path = seal_to_disk(&tmp, "forty.dat", 16, &payload, &ks);

    let mut chan = ChunkedReadChannel::open(&path, "forty.dat", ks).unwrap();
    chan.set_position(20).unwrap();
    let mut buf = [0u8; 10];
    assert_eq!(chan.read(&mut buf).unwrap(), ReadOutcome::Data(10));
    assert_eq!(&buf, &payload[0x14..0x1E]);
}

#[test]
fn payload_of_exactly_one_chunk() {
    let tmp = TempDir::new().unwrap();
    let ks = keyset();
    let payload = vec![0xABu8; 64];
    let path = seal_to_disk(&tmp, "one.dat", 64, &payload, &ks);

    let header = inspect(&path).unwrap();
    assert_eq!(header.total_chunks(), 1);
    assert_eq!(header.last_chunk_len(), 64);

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), HEADER_SIZE + 4 + 64 + AEAD_OVERHEAD);

    let mut chan = ChunkedReadChannel::open(&path, "one.dat", ks).unwrap();
    assert_eq!(read_all(&mut chan), payload);
}

#[test]
fn payload_of_chunk_size_plus_one() {
    let tmp = TempDir::new().unwrap();
    let ks = keyset();
    let payload = vec![0xCDu8; 65];
    let path = seal_to_disk(&tmp, "tail.dat", 64, &payload, &ks);

    let header = inspect(&path).unwrap();
    assert_eq!(header.total_chunks(), 2);
    assert_eq!(header.last_chunk_len(), 1);

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(
        bytes.len(),
        HEADER_SIZE + (4 + 64 + AEAD_OVERHEAD) + (4 + 1 + AEAD_OVERHEAD)
    );

    let mut chan = ChunkedReadChannel::open(&path, "tail.dat", ks).unwrap();
    assert_eq!(read_all(&mut chan), payload);
}

#[test]
fn final_byte_then_eof() {
    let tmp = TempDir::new().unwrap();
    let ks = keyset();
    let payload: Vec<u8> = (0u8..48).collect();
    let path = seal_to_disk(&tmp, "fin.dat", 16, &payload, &ks);

    let mut chan = ChunkedReadChannel::open(&path, "fin.dat", ks).unwrap();
    chan.set_position(47).unwrap();

    let mut buf = [0u8; 8];
    assert_eq!(chan.read(&mut buf).unwrap(), ReadOutcome::Data(1));
    assert_eq!(buf[0], 47);
    assert_eq!(chan.read(&mut buf).unwrap(), ReadOutcome::Eof);
}

#[test]
fn container_size_formula() {
    let tmp = TempDir::new().unwrap();
    let ks = keyset();
    let chunk_size = 100u32;

    for payload_len in [1usize, 99, 100, 101, 250, 1000] {
        let name = format!("sz-{payload_len}.dat");
        let payload = vec![0x5Au8; payload_len];
        let path = seal_to_disk(&tmp, &name, chunk_size, &payload, &ks);

        let n_chunks = payload_len.div_ceil(chunk_size as usize);
        let full_chunks = payload_len / chunk_size as usize;
        let tail = payload_len % chunk_size as usize;

        let mut expected = HEADER_SIZE + full_chunks * (4 + chunk_size as usize + AEAD_OVERHEAD);
        if tail > 0 {
            expected += 4 + tail + AEAD_OVERHEAD;
        }

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), expected, "payload_len={payload_len}");
        assert_eq!(inspect(&path).unwrap().total_chunks(), n_chunks as u64);
    }
}

proptest! {
    #[test]
    fn write_read_roundtrip(
        payload in proptest::collection::vec(any::<u8>(), 0..=4096),
        chunk_kb in 1u32..=16u32,
    ) {
        let tmp = TempDir::new().unwrap();
        let ks = keyset();
        let chunk_size = chunk_kb * 64;
        let path = seal_to_disk(&tmp, "prop.dat", chunk_size, &payload, &ks);

        let mut chan = ChunkedReadChannel::open(&path, "prop.dat", ks).unwrap();
        prop_assert_eq!(chan.size(), payload.len() as u64);
        prop_assert_eq!(read_all(&mut chan), payload);
    }

    #[test]
    fn random_access_equivalence(
        payload in proptest::collection::vec(any::<u8>(), 1..=2048),
        chunk_size in 1u32..=256u32,
        frac_pos in 0.0f64..=1.0,
        len in 0usize..=512,
    ) {
        let tmp = TempDir::new().unwrap();
        let ks = keyset();
        let path = seal_to_disk(&tmp, "ra.dat", chunk_size, &payload, &ks);

        let offset = ((payload.len() as f64) * frac_pos) as usize;
        let expected = &payload[offset..(offset + len).min(payload.len())];

        let mut chan = ChunkedReadChannel::open(&path, "ra.dat", ks).unwrap();
        chan.set_position(offset as u64).unwrap();

        let mut buf = vec![0u8; len];
        let mut got = Vec::new();
        while got.len() < expected.len() {
            match chan.read(&mut buf[got.len()..]).unwrap() {
                ReadOutcome::Data(n) => {
                    prop_assert!(n > 0);
                    got.extend_from_slice(&buf[got.len()..got.len() + n]);
                }
                ReadOutcome::Eof => break,
            }
        }
        prop_assert_eq!(got.as_slice(), expected);
    }

    #[test]
    fn seek_past_end_is_eof(
        payload in proptest::collection::vec(any::<u8>(), 0..=512),
        past in 0u64..=4096,
    ) {
        let tmp = TempDir::new().unwrap();
        let ks = keyset();
        let path = seal_to_disk(&tmp, "past.dat", 64, &payload, &ks);

        let mut chan = ChunkedReadChannel::open(&path, "past.dat", ks).unwrap();
        chan.set_position(payload.len() as u64 + past).unwrap();

        let mut buf = [0u8; 16];
        prop_assert_eq!(chan.read(&mut buf).unwrap(), ReadOutcome::Eof);
    }
}
