// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Patches bytes of a stack buffer through a linked block, saves the result to a file and
//! loads it back into an owning block.

use memlink::MemBlock;

fn main() {
    let dir = tempfile::tempdir().expect("temporary directory can be created");
    let path = dir.path().join("greeting.txt");

    let mut buffer = *b"hello, world";

    {
        // The block edits the buffer in place as long as it does not need to grow.
        let mut block = MemBlock::linked(&mut buffer);
        block.copy(0, b"H").expect("buffer is mutable");
        block.write_file(&path, None).expect("file can be written");
        println!("Linked block of {} bytes, owning: {}.", block.len(), block.is_owning());

        // Growing copies the bytes into memory owned by the block.
        block.append(b"!").expect("block can grow");
        println!("After growing: {:?}, owning: {}.", String::from_utf8_lossy(&block), block.is_owning());
    }

    println!("Buffer: {:?}", String::from_utf8_lossy(&buffer));

    let loaded = MemBlock::read_file(&path).expect("file can be read");
    println!("Loaded {} bytes with capacity {}: {:?}", loaded.len(), loaded.capacity(), String::from_utf8_lossy(&loaded));
}
