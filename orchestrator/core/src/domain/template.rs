// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Template Value Model
//!
//! Typed, immutable description of a declarative stack document. Every
//! resource kind is a plain value with named fields; references between
//! resources are [`Expr`] values and ordering constraints are explicit
//! `DependsOn` edges. The whole graph serializes to the document in a single
//! serde walk.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Duplicate logical id: {0}")]
    DuplicateId(String),

    #[error("Resource {resource} depends on unknown resource {target}")]
    DanglingDependency { resource: String, target: String },

    #[error("Failed to serialize template: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Property value: a literal or an intrinsic function
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Str(String),
    Int(i64),
    Ref(String),
    GetAtt(String, String),
    Join(String, Vec<Expr>),
    ImportValue(Box<Expr>),
}

impl Expr {
    pub fn str(value: impl Into<String>) -> Self {
        Expr::Str(value.into())
    }

    pub fn reference(id: impl Into<String>) -> Self {
        Expr::Ref(id.into())
    }

    pub fn get_att(id: impl Into<String>, attribute: impl Into<String>) -> Self {
        Expr::GetAtt(id.into(), attribute.into())
    }

    pub fn arn_of(id: impl Into<String>) -> Self {
        Expr::get_att(id, "Arn")
    }

    pub fn join(delimiter: impl Into<String>, parts: Vec<Expr>) -> Self {
        Expr::Join(delimiter.into(), parts)
    }

    pub fn import(export_name: impl Into<String>) -> Self {
        Expr::ImportValue(Box::new(Expr::Str(export_name.into())))
    }

    /// Embed in a free-form JSON document (policies, filter policies)
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Expr::Str(value.to_string())
    }
}

impl From<String> for Expr {
    fn from(value: String) -> Self {
        Expr::Str(value)
    }
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Expr::Str(s) => serializer.serialize_str(s),
            Expr::Int(i) => serializer.serialize_i64(*i),
            Expr::Ref(id) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Ref", id)?;
                map.end()
            }
            Expr::GetAtt(id, attr) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::GetAtt", &[id, attr])?;
                map.end()
            }
            Expr::Join(delimiter, parts) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::Join", &JoinArgs(delimiter, parts))?;
                map.end()
            }
            Expr::ImportValue(inner) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::ImportValue", inner.as_ref())?;
                map.end()
            }
        }
    }
}

struct JoinArgs<'a>(&'a String, &'a Vec<Expr>);

impl Serialize for JoinArgs<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(self.0)?;
        seq.serialize_element(self.1)?;
        seq.end()
    }
}

// ============================================================================
// Parameters and outputs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Parameter {
    #[serde(rename = "Type")]
    pub param_type: String,
    pub default: String,
}

impl Parameter {
    pub fn number(default: impl ToString) -> Self {
        Self {
            param_type: "Number".to_string(),
            default: default.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    pub value: Expr,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export: Option<Export>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Export {
    pub name: Expr,
}

// ============================================================================
// Resource kinds
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Bucket {
    pub bucket_name: String,
    pub access_control: String,
    pub lifecycle_configuration: LifecycleConfiguration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleConfiguration {
    pub rules: Vec<LifecycleRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleRule {
    pub prefix: String,
    pub status: String,
    pub expiration_in_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct HttpApi {
    pub name: String,
    pub protocol_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Role {
    pub path: String,
    pub policies: Vec<InlinePolicy>,
    pub assume_role_policy_document: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InlinePolicy {
    pub policy_name: String,
    pub policy_document: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Function {
    pub function_name: String,
    pub code: Code,
    pub handler: String,
    pub role: Expr,
    pub runtime: String,
    pub memory_size: Expr,
    pub timeout: Expr,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<FunctionEnvironment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_config: Option<VpcAttachment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Code {
    Artifact {
        #[serde(rename = "S3Bucket")]
        bucket: String,
        #[serde(rename = "S3Key")]
        key: String,
    },
    Inline {
        #[serde(rename = "ZipFile")]
        source: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FunctionEnvironment {
    pub variables: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpcAttachment {
    pub security_group_ids: Vec<String>,
    pub subnet_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Permission {
    pub action: String,
    pub function_name: String,
    pub principal: String,
    pub source_arn: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Integration {
    pub api_id: Expr,
    pub payload_format_version: String,
    pub integration_type: String,
    pub integration_uri: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Route {
    pub api_id: Expr,
    pub route_key: String,
    pub authorization_type: String,
    pub target: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Stage {
    pub stage_name: String,
    pub api_id: Expr,
    pub auto_deploy: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiDeployment {
    pub api_id: Expr,
    pub stage_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Queue {
    pub queue_name: String,
    pub visibility_timeout: u32,
    pub receive_message_wait_time_seconds: u32,
    pub message_retention_period: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redrive_policy: Option<QueueRedrivePolicy>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueRedrivePolicy {
    pub dead_letter_target_arn: Expr,
    pub max_receive_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueuePolicy {
    pub queues: Vec<Expr>,
    pub policy_document: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventSourceMapping {
    pub batch_size: u32,
    pub enabled: bool,
    pub event_source_arn: Expr,
    pub function_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Topic {
    pub topic_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TopicSubscription {
    pub protocol: String,
    pub endpoint: Expr,
    pub topic_arn: Expr,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_policy: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redrive_policy: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Alarm {
    pub alarm_actions: Vec<Expr>,
    pub comparison_operator: String,
    pub evaluation_periods: u32,
    pub metric_name: String,
    pub namespace: String,
    pub dimensions: Vec<MetricDimension>,
    pub period: u32,
    pub statistic: String,
    pub threshold: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricDimension {
    pub name: String,
    pub value: String,
}

/// Every resource kind the fixed topology uses
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResourceKind {
    Bucket(Bucket),
    HttpApi(HttpApi),
    Role(Role),
    Function(Function),
    Permission(Permission),
    Integration(Integration),
    Route(Route),
    Stage(Stage),
    ApiDeployment(ApiDeployment),
    Queue(Queue),
    QueuePolicy(QueuePolicy),
    EventSourceMapping(EventSourceMapping),
    Topic(Topic),
    TopicSubscription(TopicSubscription),
    Alarm(Alarm),
}

impl ResourceKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ResourceKind::Bucket(_) => "AWS::S3::Bucket",
            ResourceKind::HttpApi(_) => "AWS::ApiGatewayV2::Api",
            ResourceKind::Role(_) => "AWS::IAM::Role",
            ResourceKind::Function(_) => "AWS::Lambda::Function",
            ResourceKind::Permission(_) => "AWS::Lambda::Permission",
            ResourceKind::Integration(_) => "AWS::ApiGatewayV2::Integration",
            ResourceKind::Route(_) => "AWS::ApiGatewayV2::Route",
            ResourceKind::Stage(_) => "AWS::ApiGatewayV2::Stage",
            ResourceKind::ApiDeployment(_) => "AWS::ApiGatewayV2::Deployment",
            ResourceKind::Queue(_) => "AWS::SQS::Queue",
            ResourceKind::QueuePolicy(_) => "AWS::SQS::QueuePolicy",
            ResourceKind::EventSourceMapping(_) => "AWS::Lambda::EventSourceMapping",
            ResourceKind::Topic(_) => "AWS::SNS::Topic",
            ResourceKind::TopicSubscription(_) => "AWS::SNS::Subscription",
            ResourceKind::Alarm(_) => "AWS::CloudWatch::Alarm",
        }
    }
}

macro_rules! resource_kind_from {
    ($($kind:ident),* $(,)?) => {
        $(
            impl From<$kind> for ResourceKind {
                fn from(value: $kind) -> Self {
                    ResourceKind::$kind(value)
                }
            }
        )*
    };
}

resource_kind_from!(
    Bucket,
    HttpApi,
    Role,
    Function,
    Permission,
    Integration,
    Route,
    Stage,
    ApiDeployment,
    Queue,
    QueuePolicy,
    EventSourceMapping,
    Topic,
    TopicSubscription,
    Alarm,
);

/// One node of the resource graph
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub kind: ResourceKind,
    pub depends_on: Vec<String>,
}

impl Resource {
    pub fn new(kind: impl Into<ResourceKind>) -> Self {
        Self {
            kind: kind.into(),
            depends_on: Vec::new(),
        }
    }

    pub fn depends_on<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on.extend(ids.into_iter().map(Into::into));
        self
    }
}

impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.depends_on.is_empty() { 2 } else { 3 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("Type", self.kind.type_name())?;
        map.serialize_entry("Properties", &self.kind)?;
        if !self.depends_on.is_empty() {
            map.serialize_entry("DependsOn", &self.depends_on)?;
        }
        map.end()
    }
}

// ============================================================================
// Template document
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    version: String,
    #[serde(rename = "Parameters", skip_serializing_if = "BTreeMap::is_empty")]
    parameters: BTreeMap<String, Parameter>,
    #[serde(rename = "Resources")]
    resources: BTreeMap<String, Resource>,
    #[serde(rename = "Outputs", skip_serializing_if = "BTreeMap::is_empty")]
    outputs: BTreeMap<String, Output>,
}

impl Default for Template {
    fn default() -> Self {
        Self::new()
    }
}

impl Template {
    pub fn new() -> Self {
        Self {
            version: TEMPLATE_FORMAT_VERSION.to_string(),
            parameters: BTreeMap::new(),
            resources: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    /// Declare a parameter and return a reference to it
    pub fn add_parameter(&mut self, id: impl Into<String>, parameter: Parameter) -> Result<Expr, TemplateError> {
        let id = id.into();
        if self.parameters.contains_key(&id) || self.resources.contains_key(&id) {
            return Err(TemplateError::DuplicateId(id));
        }
        self.parameters.insert(id.clone(), parameter);
        Ok(Expr::Ref(id))
    }

    /// Declare a resource and return its logical id
    pub fn add_resource(&mut self, id: impl Into<String>, resource: Resource) -> Result<String, TemplateError> {
        let id = id.into();
        if self.resources.contains_key(&id) || self.parameters.contains_key(&id) {
            return Err(TemplateError::DuplicateId(id));
        }
        self.resources.insert(id.clone(), resource);
        Ok(id)
    }

    pub fn add_output(&mut self, id: impl Into<String>, output: Output) -> Result<(), TemplateError> {
        let id = id.into();
        if self.outputs.contains_key(&id) {
            return Err(TemplateError::DuplicateId(id));
        }
        self.outputs.insert(id, output);
        Ok(())
    }

    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resources.get(id)
    }

    pub fn resources(&self) -> impl Iterator<Item = (&String, &Resource)> {
        self.resources.iter()
    }

    pub fn parameter(&self, id: &str) -> Option<&Parameter> {
        self.parameters.get(id)
    }

    pub fn output(&self, id: &str) -> Option<&Output> {
        self.outputs.get(id)
    }

    /// Explicit `(resource, dependency)` edges
    pub fn dependency_edges(&self) -> Vec<(&str, &str)> {
        self.resources
            .iter()
            .flat_map(|(id, r)| r.depends_on.iter().map(move |d| (id.as_str(), d.as_str())))
            .collect()
    }

    /// Every dependency edge must point at a resource of this template
    pub fn validate(&self) -> Result<(), TemplateError> {
        for (resource, target) in self.dependency_edges() {
            if !self.resources.contains_key(target) {
                return Err(TemplateError::DanglingDependency {
                    resource: resource.to_string(),
                    target: target.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn to_value(&self) -> Result<Value, TemplateError> {
        self.validate()?;
        Ok(serde_json::to_value(self)?)
    }

    pub fn to_json(&self) -> Result<String, TemplateError> {
        self.validate()?;
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, TemplateError> {
        self.validate()?;
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Named stack plus its target document
#[derive(Debug, Clone, PartialEq)]
pub struct StackDescriptor {
    pub name: String,
    pub template: Template,
}

impl StackDescriptor {
    pub fn new(name: impl Into<String>, template: Template) -> Self {
        Self {
            name: name.into(),
            template,
        }
    }
}
