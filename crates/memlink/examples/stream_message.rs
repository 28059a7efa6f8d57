// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Encodes a message with a header, a name and a list of readings into a block, then decodes
//! it in another function and writes a report to the terminal.

use memlink::{BlockString, BlockVec, Checked, MemBlock, ReadCursor, StreamRead, StreamWrite, WriteCursor};

const MAGIC: u32 = 0x4D45_4D4C;

fn main() {
    let message = produce_message();

    println!("Encoded message takes {} bytes.", message.len());

    consume_message(&message);
}

fn produce_message() -> MemBlock<'static> {
    let name = BlockString::from_bytes(b"north-station").expect("message fits in memory");

    let mut readings = BlockVec::new();
    for hour in 0..24_u16 {
        readings.push(f32::from(hour) * 0.5).expect("message fits in memory");
    }

    // Header: magic number, then the name padded to the next word, then the readings.
    let header_size = (size_of::<u32>() + name.stream_size()).next_multiple_of(memlink::DEFAULT_ALIGNMENT);
    let mut message: MemBlock = MemBlock::with_len(header_size + readings.stream_size()).expect("message fits in memory");

    let mut w = WriteCursor::<Checked>::new(message.as_view_mut());
    w.write_fixed(MAGIC).expect("message is sized for its contents");
    name.write_to(&mut w).expect("message is sized for its contents");
    w.align_default().expect("message is sized for its contents");
    readings.write_to(&mut w).expect("message is sized for its contents");

    message
}

fn consume_message(message: &MemBlock<'_>) {
    let mut r = ReadCursor::<Checked>::new(message.as_view());

    let magic: u32 = r.read_fixed().expect("message has a header");
    assert_eq!(magic, MAGIC, "not one of our messages");

    let mut name = BlockString::new();
    name.read_from(&mut r).expect("message has a name");
    r.align_default().expect("name is padded");

    let mut readings = BlockVec::<f32>::new();
    readings.read_from(&mut r).expect("message has readings");

    let total: f32 = readings.iter().sum();

    println!("Station {name} sent {} readings adding up to {total}.", readings.len());
}
