//! `grpc.examples.echo.Echo`, written against tonic's server primitives so the
//! crate needs no protobuf toolchain at build time.

use std::convert::Infallible;
use std::task::{Context, Poll};

use futures::StreamExt;
use futures::stream::{self, BoxStream};
use tonic::codec::ProstCodec;
use tonic::codegen::{Body, BoxFuture, Service, StdError, empty_body, http};
use tonic::server::{ClientStreamingService, Grpc, NamedService, ServerStreamingService, StreamingService, UnaryService};
use tonic::{Request, Response, Status, Streaming};
use tracing::{debug, info};

#[derive(Clone, PartialEq, Eq, prost::Message)]
pub struct EchoRequest {
	#[prost(string, tag = "1")]
	pub message: String,
}

#[derive(Clone, PartialEq, Eq, prost::Message)]
pub struct EchoResponse {
	#[prost(string, tag = "1")]
	pub message: String,
}

impl EchoResponse {
	fn echo(request: EchoRequest) -> Self {
		Self { message: request.message }
	}
}

/// Metadata key logged on unary calls when present.
const TEST_HEADER: &str = "my_test_header_key";

/// Fully qualified RPC paths.
pub mod path {
	pub const UNARY: &str = "/grpc.examples.echo.Echo/UnaryEcho";
	pub const SERVER_STREAMING: &str = "/grpc.examples.echo.Echo/ServerStreamingEcho";
	pub const CLIENT_STREAMING: &str = "/grpc.examples.echo.Echo/ClientStreamingEcho";
	pub const BIDI_STREAMING: &str = "/grpc.examples.echo.Echo/BidirectionalStreamingEcho";
}

/// Echo service state, copied into every call.
#[derive(Debug, Clone, Copy)]
pub struct EchoService {
	fanout: u32,
}

impl EchoService {
	/// `fanout` is how many responses `ServerStreamingEcho` sends per request.
	pub fn new(fanout: u32) -> Self {
		Self { fanout }
	}
}

impl NamedService for EchoService {
	const NAME: &'static str = "grpc.examples.echo.Echo";
}

impl<B> Service<http::Request<B>> for EchoService
where
	B: Body + Send + 'static,
	B::Error: Into<StdError> + Send + 'static,
{
	type Response = http::Response<tonic::body::BoxBody>;
	type Error = Infallible;
	type Future = BoxFuture<Self::Response, Self::Error>;

	fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		Poll::Ready(Ok(()))
	}

	fn call(&mut self, req: http::Request<B>) -> Self::Future {
		let fanout = self.fanout;
		match req.uri().path() {
			path::UNARY => Box::pin(async move { Ok(grpc().unary(Unary, req).await) }),
			path::SERVER_STREAMING => Box::pin(async move { Ok(grpc().server_streaming(ServerStreaming { fanout }, req).await) }),
			path::CLIENT_STREAMING => Box::pin(async move { Ok(grpc().client_streaming(ClientStreaming, req).await) }),
			path::BIDI_STREAMING => Box::pin(async move { Ok(grpc().streaming(BidiStreaming, req).await) }),
			other => {
				debug!(path = other, "unimplemented grpc method");
				Box::pin(async move { Ok(unimplemented()) })
			}
		}
	}
}

fn grpc() -> Grpc<ProstCodec<EchoResponse, EchoRequest>> {
	Grpc::new(ProstCodec::default())
}

fn unimplemented() -> http::Response<tonic::body::BoxBody> {
	let mut response = http::Response::new(empty_body());
	let headers = response.headers_mut();
	headers.insert("grpc-status", http::HeaderValue::from(tonic::Code::Unimplemented as i32));
	headers.insert(http::header::CONTENT_TYPE, http::HeaderValue::from_static("application/grpc"));
	response
}

struct Unary;

impl UnaryService<EchoRequest> for Unary {
	type Response = EchoResponse;
	type Future = BoxFuture<Response<EchoResponse>, Status>;

	fn call(&mut self, request: Request<EchoRequest>) -> Self::Future {
		if let Some(value) = request.metadata().get(TEST_HEADER) {
			info!(?value, "unary echo test header");
		}
		let request = request.into_inner();
		info!(message = %request.message, "unary echo");
		Box::pin(async move { Ok(Response::new(EchoResponse::echo(request))) })
	}
}

struct ServerStreaming {
	fanout: u32,
}

impl ServerStreamingService<EchoRequest> for ServerStreaming {
	type Response = EchoResponse;
	type ResponseStream = BoxStream<'static, Result<EchoResponse, Status>>;
	type Future = BoxFuture<Response<Self::ResponseStream>, Status>;

	fn call(&mut self, request: Request<EchoRequest>) -> Self::Future {
		let fanout = self.fanout;
		let message = request.into_inner().message;
		info!(%message, fanout, "server streaming echo");

		let replies: Self::ResponseStream = stream::iter(0..fanout)
			.map(move |_| {
				Ok(EchoResponse {
					message: message.clone(),
				})
			})
			.boxed();
		Box::pin(async move { Ok(Response::new(replies)) })
	}
}

struct ClientStreaming;

impl ClientStreamingService<EchoRequest> for ClientStreaming {
	type Response = EchoResponse;
	type Future = BoxFuture<Response<EchoResponse>, Status>;

	fn call(&mut self, request: Request<Streaming<EchoRequest>>) -> Self::Future {
		Box::pin(reply_with_last(request.into_inner()))
	}
}

async fn reply_with_last(mut incoming: Streaming<EchoRequest>) -> Result<Response<EchoResponse>, Status> {
	let mut last = EchoRequest::default();
	while let Some(received) = incoming.message().await? {
		debug!(message = %received.message, "client streaming echo received");
		last = received;
	}
	info!(message = %last.message, "client streaming echo replies with last message");
	Ok(Response::new(EchoResponse::echo(last)))
}

struct BidiStreaming;

impl StreamingService<EchoRequest> for BidiStreaming {
	type Response = EchoResponse;
	type ResponseStream = BoxStream<'static, Result<EchoResponse, Status>>;
	type Future = BoxFuture<Response<Self::ResponseStream>, Status>;

	fn call(&mut self, request: Request<Streaming<EchoRequest>>) -> Self::Future {
		info!("bidirectional streaming echo");
		let replies: Self::ResponseStream = request
			.into_inner()
			.map(|received| {
				let received = received?;
				debug!(message = %received.message, "bidirectional echo");
				Ok(EchoResponse::echo(received))
			})
			.boxed();
		Box::pin(async move { Ok(Response::new(replies)) })
	}
}
