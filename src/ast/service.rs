use std::fmt;

use crate::{
    ast::{
        check_ident, check_unique, missing, normalize_documentation,
        option::{check_options, OptionStatement},
        resolve_qualified_name, OptionElement,
    },
    case::{is_valid_full_ident, is_valid_type_name},
    error::ValidationError,
    fmt::{write_documentation, Block},
};

/// A service declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceElement {
    name: String,
    qualified_name: String,
    documentation: String,
    options: Vec<OptionElement>,
    rpcs: Vec<RpcElement>,
}

/// A builder for [`ServiceElement`].
#[derive(Debug, Default)]
pub struct ServiceElementBuilder {
    name: Option<String>,
    qualified_name: Option<String>,
    documentation: String,
    options: Vec<OptionElement>,
    rpcs: Vec<RpcElement>,
}

/// A method of a service, such as `rpc Search (Request) returns (stream Response);`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RpcElement {
    name: String,
    documentation: String,
    request_type: String,
    response_type: String,
    request_streaming: bool,
    response_streaming: bool,
    options: Vec<OptionElement>,
}

/// A builder for [`RpcElement`].
#[derive(Debug, Default)]
pub struct RpcElementBuilder {
    name: Option<String>,
    documentation: String,
    request_type: Option<String>,
    response_type: Option<String>,
    request_streaming: bool,
    response_streaming: bool,
    options: Vec<OptionElement>,
}

impl ServiceElement {
    /// Creates a new builder.
    pub fn builder() -> ServiceElementBuilder {
        ServiceElementBuilder::default()
    }

    /// The name of the service.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name of the service, prefixed with the package.
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub(crate) fn qualify(&mut self, prefix: &str) -> Result<(), ValidationError> {
        let expected = format!("{}{}", prefix, self.name);
        resolve_qualified_name(&mut self.qualified_name, &self.name, expected)
    }

    /// The documentation comment, or an empty string.
    pub fn documentation(&self) -> &str {
        &self.documentation
    }

    /// The `option` statements in the service body.
    pub fn options(&self) -> &[OptionElement] {
        &self.options
    }

    /// The methods of the service.
    pub fn rpcs(&self) -> &[RpcElement] {
        &self.rpcs
    }
}

impl ServiceElementBuilder {
    /// Sets the name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the fully-qualified name. Defaults to the name, and is filled in from the enclosing
    /// scope when the element is added to a [`ProtoFile`](crate::ProtoFile).
    pub fn qualified_name(mut self, qualified_name: impl Into<String>) -> Self {
        self.qualified_name = Some(qualified_name.into());
        self
    }

    /// Sets the documentation comment.
    pub fn documentation(mut self, documentation: impl AsRef<str>) -> Self {
        self.documentation = normalize_documentation(documentation.as_ref());
        self
    }

    /// Adds an option.
    pub fn add_option(mut self, option: OptionElement) -> Self {
        self.options.push(option);
        self
    }

    /// Adds a method.
    pub fn add_rpc(mut self, rpc: RpcElement) -> Self {
        self.rpcs.push(rpc);
        self
    }

    /// Validates and builds the service.
    pub fn build(self) -> Result<ServiceElement, ValidationError> {
        let name = self.name.ok_or_else(|| missing("service", "name"))?;
        check_ident("service", &name)?;

        let qualified_name = self.qualified_name.unwrap_or_else(|| name.clone());
        if !is_valid_full_ident(&qualified_name) {
            return Err(ValidationError::InvalidName {
                kind: "qualified",
                name: qualified_name,
            });
        }

        check_unique("rpc", self.rpcs.iter().map(RpcElement::name))?;

        check_options(&self.options)?;

        Ok(ServiceElement {
            name,
            qualified_name,
            documentation: self.documentation,
            options: self.options,
            rpcs: self.rpcs,
        })
    }
}

impl RpcElement {
    /// Creates a new builder.
    pub fn builder() -> RpcElementBuilder {
        RpcElementBuilder::default()
    }

    /// The name of the method.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The documentation comment, or an empty string.
    pub fn documentation(&self) -> &str {
        &self.documentation
    }

    /// The name of the request message type.
    pub fn request_type(&self) -> &str {
        &self.request_type
    }

    /// The name of the response message type.
    pub fn response_type(&self) -> &str {
        &self.response_type
    }

    /// Returns `true` if the client sends a stream of requests.
    pub fn request_streaming(&self) -> bool {
        self.request_streaming
    }

    /// Returns `true` if the server sends a stream of responses.
    pub fn response_streaming(&self) -> bool {
        self.response_streaming
    }

    /// The `option` statements in the method body.
    pub fn options(&self) -> &[OptionElement] {
        &self.options
    }
}

impl RpcElementBuilder {
    /// Sets the name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the documentation comment.
    pub fn documentation(mut self, documentation: impl AsRef<str>) -> Self {
        self.documentation = normalize_documentation(documentation.as_ref());
        self
    }

    /// Sets the request message type.
    pub fn request_type(mut self, request_type: impl Into<String>) -> Self {
        self.request_type = Some(request_type.into());
        self
    }

    /// Sets the response message type.
    pub fn response_type(mut self, response_type: impl Into<String>) -> Self {
        self.response_type = Some(response_type.into());
        self
    }

    /// Sets whether the client sends a stream of requests.
    pub fn request_streaming(mut self, streaming: bool) -> Self {
        self.request_streaming = streaming;
        self
    }

    /// Sets whether the server sends a stream of responses.
    pub fn response_streaming(mut self, streaming: bool) -> Self {
        self.response_streaming = streaming;
        self
    }

    /// Adds an option.
    pub fn add_option(mut self, option: OptionElement) -> Self {
        self.options.push(option);
        self
    }

    /// Validates and builds the method.
    pub fn build(self) -> Result<RpcElement, ValidationError> {
        let name = self.name.ok_or_else(|| missing("rpc", "name"))?;
        let request_type = self
            .request_type
            .ok_or_else(|| missing("rpc", "request type"))?;
        let response_type = self
            .response_type
            .ok_or_else(|| missing("rpc", "response type"))?;

        check_ident("rpc", &name)?;
        for ty in [&request_type, &response_type] {
            if !is_valid_type_name(ty) {
                return Err(ValidationError::InvalidTypeName {
                    name,
                    ty: ty.clone(),
                });
            }
        }

        check_options(&self.options)?;

        Ok(RpcElement {
            name,
            documentation: self.documentation,
            request_type,
            response_type,
            request_streaming: self.request_streaming,
            response_streaming: self.response_streaming,
            options: self.options,
        })
    }
}

impl fmt::Display for ServiceElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_documentation(f, &self.documentation)?;

        let mut block = Block::new();
        block.group(self.options.iter().map(OptionStatement));
        block.group(&self.rpcs);
        block.write(f, format_args!("service {}", self.name))
    }
}

impl fmt::Display for RpcElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_documentation(f, &self.documentation)?;

        let signature = format!(
            "rpc {} ({}{}) returns ({}{})",
            self.name,
            if self.request_streaming { "stream " } else { "" },
            self.request_type,
            if self.response_streaming { "stream " } else { "" },
            self.response_type,
        );

        if self.options.is_empty() {
            writeln!(f, "{};", signature)
        } else {
            let mut block = Block::new();
            block.group(self.options.iter().map(OptionStatement));
            block.write(f, format_args!("{}", signature))
        }
    }
}
