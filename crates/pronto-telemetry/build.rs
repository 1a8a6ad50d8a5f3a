//! Generates the `SignalService` gRPC client and server.
//!
//! The messages are declared by hand with `prost` derives in `src/lib.rs`,
//! so only the service glue is generated here and no `protoc` is needed.

fn main() {
    let stream_signals = tonic_build::manual::Method::builder()
        .name("stream_signals")
        .route_name("StreamSignals")
        .input_type("crate::proto::Signal")
        .output_type("crate::proto::SignalAck")
        .codec_path("tonic::codec::ProstCodec")
        .client_streaming()
        .server_streaming()
        .build();

    let service = tonic_build::manual::Service::builder()
        .name("SignalService")
        .package("pronto.telemetry.v1")
        .method(stream_signals)
        .build();

    tonic_build::manual::Builder::new().compile(&[service]);
}
