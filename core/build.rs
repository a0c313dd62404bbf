fn main() {
    uniffi::generate_scaffolding("src/dive_ops.udl").unwrap();
}
