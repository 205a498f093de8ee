// Build script for catalog-service
// Compiles the catalog.v1 contract for gRPC server and client code generation
fn main() {
    println!("cargo:rerun-if-changed=../proto/catalog/v1");

    // Fall back to the bundled protoc when none is configured
    if std::env::var_os("PROTOC").is_none() {
        if let Ok(protoc) = protoc_bin_vendored::protoc_bin_path() {
            std::env::set_var("PROTOC", protoc);
        }
    }

    // catalog-service PROVIDES CatalogService and AuthService
    // Client code backs the token refresher and the integration tests
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(
            &[
                "../proto/catalog/v1/catalog_service.proto",
                "../proto/catalog/v1/auth_service.proto",
            ],
            &["../proto/catalog/v1"],
        )
        .expect("Failed to compile catalog.v1 protos for catalog-service");
}
