// Benchmarks for the hot codec paths: submit_sm encode/decode and the
// GSM 03.38 text pipeline.

use bytes::Bytes;
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use esme::codec::Encodable;
use esme::datatypes::SubmitSm;
use esme::frame::Frame;
use esme::text::{gsm7_encode, gsm7_pack, ucs2_encode};
use std::io::Cursor;

fn sample_submit_sm() -> SubmitSm {
    SubmitSm {
        sequence_number: 1,
        source_addr_ton: 0x01,
        source_addr_npi: 0x01,
        source_addr: "12345".into(),
        dest_addr_ton: 0x01,
        dest_addr_npi: 0x01,
        destination_addr: "5511999999999".into(),
        short_message: Bytes::from_static(b"Hello World"),
        ..Default::default()
    }
}

fn bench_encode(c: &mut Criterion) {
    let pdu = sample_submit_sm();
    c.bench_function("submit_sm_encode", |b| {
        b.iter(|| black_box(&pdu).to_bytes());
    });
}

fn bench_decode(c: &mut Criterion) {
    let bytes = sample_submit_sm().to_bytes();
    c.bench_function("submit_sm_decode", |b| {
        b.iter(|| {
            let mut cursor = Cursor::new(black_box(bytes.as_ref()));
            Frame::parse(&mut cursor).unwrap()
        });
    });
}

fn bench_text_codecs(c: &mut Criterion) {
    let text = "The quick brown fox jumps over the lazy dog, twice over. €".repeat(2);
    c.bench_function("gsm7_encode_120_chars", |b| {
        b.iter(|| gsm7_encode(black_box(&text)));
    });

    let septets = gsm7_encode(&text);
    c.bench_function("gsm7_pack_120_septets", |b| {
        b.iter(|| gsm7_pack(black_box(&septets)));
    });

    c.bench_function("ucs2_encode_120_chars", |b| {
        b.iter(|| ucs2_encode(black_box(&text)));
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_text_codecs);
criterion_main!(benches);
