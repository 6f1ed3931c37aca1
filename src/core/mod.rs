pub mod exchange;
pub mod forwarder;
pub mod hooks;
pub mod pipeline;
pub mod proxy;
pub mod target;

pub use exchange::{ProxyRequest, ProxyResponse, StagedStatus, UpstreamResponse};
pub use forwarder::RequestForwarder;
pub use hooks::{FnInterceptor, HookSet, Interceptor, RequestDecorator, intercept_fn};
pub use pipeline::ResponsePipeline;
pub use proxy::{ProxyService, ProxyServiceBuilder};
pub use target::{Scheme, TargetDescriptor};
