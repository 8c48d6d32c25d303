// This binary crate is intentionally minimal.
// All engine logic lives in the library (src/lib.rs and its modules).
// Run demos with:
//   cargo run --example xor
//   cargo run --example evolution
fn main() {
    println!("axon-nn: a feed-forward neural network engine in Rust.");
    println!("Run `cargo run --example xor` to see the XOR training demo.");
}
