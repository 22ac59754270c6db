//! Resolution of an [`EndpointInput`] into an endpoint and its configuration.

use std::fmt;
use std::sync::Arc;

use super::{AnnotatedEndpoint, ClientEndpoint, Endpoint, EndpointConfig, EndpointInput};
use crate::collector::ErrorCollector;
use crate::error::Error;

/// An endpoint ready to be connected.
#[derive(Clone)]
pub struct ResolvedEndpoint {
    /// The endpoint whose callbacks the session drives.
    pub endpoint: Arc<dyn Endpoint>,
    /// The configuration to connect with.
    pub config: EndpointConfig,
}

impl fmt::Debug for ResolvedEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedEndpoint")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Maps every [`EndpointInput`] shape to a [`ResolvedEndpoint`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EndpointResolver;

impl EndpointResolver {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Resolve `input`.
    ///
    /// Programmatic inputs use `supplied` (or a default configuration).
    /// Annotated inputs derive their configuration from their marker and
    /// ignore `supplied`. Failures are recorded in `errors` and yield `None`.
    pub fn resolve(
        &self,
        input: &EndpointInput,
        supplied: Option<EndpointConfig>,
        errors: &mut ErrorCollector,
    ) -> Option<ResolvedEndpoint> {
        match input {
            EndpointInput::Instance(endpoint) => Some(ResolvedEndpoint {
                endpoint: Arc::clone(endpoint),
                config: supplied.unwrap_or_default(),
            }),
            EndpointInput::Class(class) => match class.instantiate() {
                Ok(endpoint) => Some(ResolvedEndpoint {
                    endpoint,
                    config: supplied.unwrap_or_default(),
                }),
                Err(source) => {
                    errors.add(Error::Instantiation {
                        type_name: class.name().to_string(),
                        source,
                    });
                    None
                }
            },
            EndpointInput::AnnotatedClass(class) => {
                let marker = Self::marker(class.name(), class.marker(), errors)?;
                Self::ignore_supplied(class.name(), supplied.as_ref());
                match class.instantiate() {
                    Ok(handler) => Some(ResolvedEndpoint {
                        endpoint: Arc::new(AnnotatedEndpoint::new(handler)),
                        config: marker.to_config(),
                    }),
                    Err(source) => {
                        errors.add(Error::Instantiation {
                            type_name: class.name().to_string(),
                            source,
                        });
                        None
                    }
                }
            }
            EndpointInput::AnnotatedInstance(instance) => {
                let marker = Self::marker(instance.name(), instance.marker(), errors)?;
                Self::ignore_supplied(instance.name(), supplied.as_ref());
                Some(ResolvedEndpoint {
                    endpoint: Arc::new(AnnotatedEndpoint::new(instance.handler())),
                    config: marker.to_config(),
                })
            }
        }
    }

    fn marker<'a>(
        name: &str,
        marker: Option<&'a ClientEndpoint>,
        errors: &mut ErrorCollector,
    ) -> Option<&'a ClientEndpoint> {
        if marker.is_none() {
            errors.add(Error::Resolution(format!(
                "{} is neither an Endpoint nor declared as a client endpoint",
                name
            )));
        }
        marker
    }

    fn ignore_supplied(name: &str, supplied: Option<&EndpointConfig>) {
        if supplied.is_some() {
            tracing::debug!(
                endpoint = name,
                "supplied config ignored for declared client endpoint"
            );
        }
    }
}
