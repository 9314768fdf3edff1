// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Resource Graph Builder
//!
//! Pure functions from the deployment model to stack documents.
//!
//! # Project stack
//!
//! Artifact bucket, HTTP API, placeholder default function with its
//! integration and `$default` route, the `v2` stage and an exported API id
//! that every context stack imports.
//!
//! # Context stack
//!
//! Sync and async functions sharing one execution role, the context's
//! integration plus base and proxy routes, an invoke permission scoped to the
//! project API, queue and dead-letter queue with access policies, the
//! queue-to-function mapping, the context topic and its subscriptions.
//! VPC attachment and error alerting are added only when configured.

use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::application::subscription_topology::{QueueWiring, SubscriptionTopology};
use crate::domain::context::Context;
use crate::domain::deployment::Deployment;
use crate::domain::naming::{camelize, FunctionRole, ResourceNames};
use crate::domain::project_config::ProviderConfig;
use crate::domain::template::{
    Alarm, ApiDeployment, Bucket, Code, EventSourceMapping, Export, Expr, Function, FunctionEnvironment, HttpApi,
    InlinePolicy, Integration, LifecycleConfiguration, LifecycleRule, MetricDimension, Output, Parameter, Permission,
    Queue, QueuePolicy, QueueRedrivePolicy, Resource, Role, Route, Stage, StackDescriptor, Template, TemplateError,
    Topic, TopicSubscription, VpcAttachment,
};

pub const STAGE_NAME: &str = "v2";
/// Entry point of the bundled runtime
pub const FUNCTION_HANDLER: &str = "bootstrap";
pub const QUEUE_WAIT_TIME_SECONDS: u32 = 20;
/// 14 days
pub const QUEUE_RETENTION_SECONDS: u32 = 1_209_600;
pub const MAX_RECEIVE_COUNT: u32 = 1000;
/// Seconds added to the async timeout so a message stays hidden while processed
pub const VISIBILITY_MARGIN_SECONDS: u32 = 5;

const PLACEHOLDER_RUNTIME: &str = "python3.12";
const PLACEHOLDER_HANDLER: &str = "index.handler";
const PLACEHOLDER_SOURCE: &str = "def handler(event, context):\n    return event";

pub struct ResourceGraphBuilder {
    names: ResourceNames,
    deployment: Deployment,
    provider: ProviderConfig,
}

impl ResourceGraphBuilder {
    pub fn new(deployment: &Deployment, provider: &ProviderConfig) -> Self {
        Self {
            names: deployment.names(),
            deployment: deployment.clone(),
            provider: provider.clone(),
        }
    }

    pub fn names(&self) -> &ResourceNames {
        &self.names
    }

    pub fn build_project_stack(&self) -> Result<StackDescriptor, TemplateError> {
        let names = &self.names;
        let functions = &self.provider.functions;
        let mut template = Template::new();

        let prefix = camelize(&names.stack_name(None));
        let memory_size = template.add_parameter(format!("{prefix}MemorySize"), Parameter::number(functions.memory_size))?;
        let gateway_timeout =
            template.add_parameter(format!("{prefix}GatewayTimeout"), Parameter::number(functions.sync_timeout))?;

        template.add_resource(
            camelize(&self.deployment.bucket),
            Resource::new(Bucket {
                bucket_name: self.deployment.bucket.clone(),
                access_control: "Private".to_string(),
                lifecycle_configuration: LifecycleConfiguration {
                    rules: vec![LifecycleRule {
                        prefix: "tmp".to_string(),
                        status: "Enabled".to_string(),
                        expiration_in_days: 1,
                    }],
                },
            }),
        )?;

        let api_name = names.rest_api_name();
        let api = template.add_resource(
            &api_name,
            Resource::new(HttpApi {
                name: names.human_api_name(),
                protocol_type: "HTTP".to_string(),
            }),
        )?;

        let role = add_role(&mut template, format!("{api_name}Role"))?;

        let function = template.add_resource(
            format!("{api_name}Function"),
            Resource::new(Function {
                function_name: api_name.clone(),
                code: Code::Inline {
                    source: PLACEHOLDER_SOURCE.to_string(),
                },
                handler: PLACEHOLDER_HANDLER.to_string(),
                role: Expr::arn_of(&role),
                runtime: PLACEHOLDER_RUNTIME.to_string(),
                memory_size,
                timeout: gateway_timeout,
                environment: None,
                vpc_config: None,
            }),
        )?;

        let integration = template.add_resource(
            names.integration_name(None),
            Resource::new(Integration {
                api_id: Expr::reference(&api),
                payload_format_version: "2.0".to_string(),
                integration_type: "AWS_PROXY".to_string(),
                integration_uri: self.function_uri(&function),
            })
            .depends_on([&function]),
        )?;

        let route = template.add_resource(
            names.route_name(None),
            Resource::new(Route {
                api_id: Expr::reference(&api),
                route_key: "$default".to_string(),
                authorization_type: "NONE".to_string(),
                target: integration_target(&integration),
            })
            .depends_on([&integration]),
        )?;

        let stage = template.add_resource(
            format!("{api_name}Stage"),
            Resource::new(Stage {
                stage_name: STAGE_NAME.to_string(),
                api_id: Expr::reference(&api),
                auto_deploy: true,
            }),
        )?;

        template.add_resource(
            format!("{api_name}Deployment"),
            Resource::new(ApiDeployment {
                api_id: Expr::reference(&api),
                stage_name: STAGE_NAME.to_string(),
            })
            .depends_on([&stage, &route, &integration, &api]),
        )?;

        template.add_output(
            names.rest_api_reference(),
            Output {
                value: Expr::reference(&api),
                export: Some(Export {
                    name: Expr::str(names.rest_api_reference()),
                }),
            },
        )?;

        template.validate()?;
        Ok(StackDescriptor::new(names.stack_name(None), template))
    }

    pub fn build_context_stack(
        &self,
        context: &Context,
        code_key: &str,
        topology: &SubscriptionTopology,
    ) -> Result<StackDescriptor, TemplateError> {
        let names = &self.names;
        let functions = &self.provider.functions;
        let ctx = context.name.as_str();
        let base = names.lambda_resource_name(ctx);
        let mut template = Template::new();

        let memory_size = template.add_parameter(format!("{base}MemorySize"), Parameter::number(functions.memory_size))?;
        let gateway_timeout =
            template.add_parameter(format!("{base}GatewayTimeout"), Parameter::number(functions.sync_timeout))?;
        let async_timeout =
            template.add_parameter(format!("{base}AsyncTimeout"), Parameter::number(functions.async_timeout))?;

        let role = add_role(&mut template, names.execution_role_name(ctx))?;

        let sync_name = names.function_name(ctx, FunctionRole::Sync);
        let sync_fn = template.add_resource(
            &sync_name,
            Resource::new(self.function(context, &sync_name, code_key, &role, memory_size.clone(), gateway_timeout)),
        )?;

        let route_segment = names.route_segment(ctx);
        template.add_resource(
            format!("{sync_name}Permission"),
            Resource::new(Permission {
                action: "lambda:InvokeFunction".to_string(),
                function_name: sync_name.clone(),
                principal: "apigateway.amazonaws.com".to_string(),
                source_arn: Expr::join(
                    "",
                    vec![
                        Expr::str("arn:aws:execute-api:"),
                        Expr::str(names.region()),
                        Expr::str(":"),
                        Expr::str(names.account_id()),
                        Expr::str(":"),
                        Expr::import(names.rest_api_reference()),
                        Expr::str("/*/*/"),
                        Expr::str(&route_segment),
                        Expr::str("*"),
                    ],
                ),
            })
            .depends_on([&sync_fn]),
        )?;

        let async_name = names.function_name(ctx, FunctionRole::Async);
        let async_fn = template.add_resource(
            &async_name,
            Resource::new(self.function(context, &async_name, code_key, &role, memory_size, async_timeout)),
        )?;

        let integration = template.add_resource(
            names.integration_name(Some(ctx)),
            Resource::new(Integration {
                api_id: Expr::import(names.rest_api_reference()),
                payload_format_version: "2.0".to_string(),
                integration_type: "AWS_PROXY".to_string(),
                integration_uri: self.function_uri(&sync_fn),
            }),
        )?;

        let route_name = names.route_name(Some(ctx));
        for (suffix, route_key) in [
            ("Base", format!("ANY /{route_segment}")),
            ("Proxy", format!("ANY /{route_segment}/{{proxy+}}")),
        ] {
            template.add_resource(
                format!("{route_name}{suffix}"),
                Resource::new(Route {
                    api_id: Expr::import(names.rest_api_reference()),
                    route_key,
                    authorization_type: "NONE".to_string(),
                    target: integration_target(&integration),
                })
                .depends_on([&integration]),
            )?;
        }

        if let Some(errors) = &self.provider.errors {
            let alerts = template.add_resource(
                names.alert_topic_name(ctx),
                Resource::new(Topic {
                    topic_name: names.alert_topic_name(ctx),
                }),
            )?;
            for function_name in [&sync_name, &async_name] {
                self.add_error_alarm(&mut template, function_name, ctx, &alerts)?;
            }

            if let Some(email) = &errors.email {
                template.add_resource(
                    names.alarm_subscription_name(ctx),
                    Resource::new(TopicSubscription {
                        protocol: "email".to_string(),
                        endpoint: Expr::str(&email.recipients),
                        topic_arn: Expr::str(names.alert_topic_arn(ctx)),
                        filter_policy: None,
                        redrive_policy: None,
                    })
                    .depends_on([&alerts]),
                )?;
            }
        }

        let topic_arns = topology.topic_arns(names);
        let visibility_timeout = functions.async_timeout + VISIBILITY_MARGIN_SECONDS;

        let dlq = template.add_resource(
            names.dead_letter_queue_name(ctx),
            Resource::new(Queue {
                queue_name: names.dead_letter_queue_name(ctx),
                visibility_timeout,
                receive_message_wait_time_seconds: QUEUE_WAIT_TIME_SECONDS,
                message_retention_period: QUEUE_RETENTION_SECONDS,
                redrive_policy: None,
            }),
        )?;
        add_queue_policy(&mut template, &dlq, &topic_arns)?;

        let queue = template.add_resource(
            names.queue_name(ctx),
            Resource::new(Queue {
                queue_name: names.queue_name(ctx),
                visibility_timeout,
                receive_message_wait_time_seconds: QUEUE_WAIT_TIME_SECONDS,
                message_retention_period: QUEUE_RETENTION_SECONDS,
                redrive_policy: Some(QueueRedrivePolicy {
                    dead_letter_target_arn: Expr::arn_of(&dlq),
                    max_receive_count: MAX_RECEIVE_COUNT,
                }),
            })
            .depends_on([&dlq]),
        )?;
        add_queue_policy(&mut template, &queue, &topic_arns)?;

        template.add_resource(
            format!("{base}AsyncMapping"),
            Resource::new(EventSourceMapping {
                batch_size: 1,
                enabled: true,
                event_source_arn: Expr::arn_of(&queue),
                function_name: async_name.clone(),
            })
            .depends_on([&queue, &async_fn]),
        )?;

        let topic = template.add_resource(
            names.topic_name(ctx),
            Resource::new(Topic {
                topic_name: names.topic_name(ctx),
            }),
        )?;

        topology.apply(
            &mut template,
            names,
            QueueWiring {
                queue_id: &queue,
                dead_letter_queue_id: &dlq,
                topic_id: &topic,
            },
        )?;

        template.validate()?;
        Ok(StackDescriptor::new(names.stack_name(Some(ctx)), template))
    }

    /// Default variables merged with the context's overrides
    pub fn function_environment(&self, context: &Context) -> BTreeMap<String, String> {
        let mut variables = BTreeMap::from([
            ("PROJECT".to_string(), self.deployment.project.clone()),
            ("ENV".to_string(), self.deployment.environment.clone()),
            ("ACCOUNT_ID".to_string(), self.deployment.account_id.clone()),
            ("CONTEXT".to_string(), context.name.clone()),
            ("REGION".to_string(), self.deployment.region.clone()),
            ("BUCKET".to_string(), self.deployment.bucket.clone()),
        ]);
        variables.extend(context.environment.clone());
        variables
    }

    fn function(
        &self,
        context: &Context,
        function_name: &str,
        code_key: &str,
        role: &str,
        memory_size: Expr,
        timeout: Expr,
    ) -> Function {
        Function {
            function_name: function_name.to_string(),
            code: Code::Artifact {
                bucket: self.deployment.bucket.clone(),
                key: code_key.to_string(),
            },
            handler: FUNCTION_HANDLER.to_string(),
            role: Expr::arn_of(role),
            runtime: self.provider.runtime.clone(),
            memory_size,
            timeout,
            environment: Some(FunctionEnvironment {
                variables: self.function_environment(context),
            }),
            vpc_config: self
                .provider
                .vpc
                .as_ref()
                .filter(|vpc| vpc.is_complete())
                .map(|vpc| VpcAttachment {
                    security_group_ids: vpc.security_group_ids.clone(),
                    subnet_ids: vpc.subnet_ids.clone(),
                }),
        }
    }

    fn function_uri(&self, function_id: &str) -> Expr {
        Expr::join(
            "",
            vec![
                Expr::str("arn:aws:lambda:"),
                Expr::str(self.names.region()),
                Expr::str(":"),
                Expr::str(self.names.account_id()),
                Expr::str(":function:"),
                Expr::reference(function_id),
            ],
        )
    }

    fn add_error_alarm(
        &self,
        template: &mut Template,
        function_name: &str,
        context: &str,
        alerts_topic: &str,
    ) -> Result<String, TemplateError> {
        template.add_resource(
            format!("{function_name}ErrorAlarm"),
            Resource::new(Alarm {
                alarm_actions: vec![Expr::str(self.names.alert_topic_arn(context))],
                comparison_operator: "GreaterThanThreshold".to_string(),
                evaluation_periods: 1,
                metric_name: "Errors".to_string(),
                namespace: "AWS/Lambda".to_string(),
                dimensions: vec![MetricDimension {
                    name: "FunctionName".to_string(),
                    value: function_name.to_string(),
                }],
                period: 60,
                statistic: "Sum".to_string(),
                threshold: 0,
            })
            .depends_on([alerts_topic]),
        )
    }
}

/// Minimal stack holding only the topic of a context outside the project
pub fn build_topic_stack(names: &ResourceNames, context: &str) -> Result<StackDescriptor, TemplateError> {
    let mut template = Template::new();
    template.add_resource(
        names.topic_name(context),
        Resource::new(Topic {
            topic_name: names.topic_name(context),
        }),
    )?;
    Ok(StackDescriptor::new(names.stack_name(Some(context)), template))
}

fn integration_target(integration_id: &str) -> Expr {
    Expr::join("/", vec![Expr::str("integrations"), Expr::reference(integration_id)])
}

fn add_role(template: &mut Template, role_name: String) -> Result<String, TemplateError> {
    template.add_resource(
        role_name,
        Resource::new(Role {
            path: "/".to_string(),
            policies: vec![InlinePolicy {
                policy_name: "root".to_string(),
                policy_document: execution_policy(),
            }],
            assume_role_policy_document: json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Action": ["sts:AssumeRole"],
                    "Effect": "Allow",
                    "Principal": {"Service": ["lambda.amazonaws.com"]},
                }],
            }),
        }),
    )
}

fn execution_policy() -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Action": ["logs:*"],
                "Resource": "arn:aws:logs:*:*:*",
                "Effect": "Allow",
            },
            {
                "Action": [
                    "cloudfront:CreateInvalidation",
                    "ec2:*NetworkInterface",
                    "ec2:DescribeNetworkInterfaces",
                    "lambda:InvokeFunction",
                    "rds-data:*",
                    "s3:*",
                    "secretsmanager:GetSecretValue",
                    "sns:*",
                    "sqs:*",
                ],
                "Resource": "*",
                "Effect": "Allow",
            },
        ],
    })
}

/// Allow `SendMessage` only from the subscribed topics
fn add_queue_policy(template: &mut Template, queue_id: &str, topic_arns: &[String]) -> Result<String, TemplateError> {
    let policy_id = format!("{queue_id}Policy");
    template.add_resource(
        &policy_id,
        Resource::new(QueuePolicy {
            queues: vec![Expr::reference(queue_id)],
            policy_document: json!({
                "Version": "2008-10-17",
                "Id": &policy_id,
                "Statement": [{
                    "Action": ["sqs:SendMessage"],
                    "Effect": "Allow",
                    "Resource": Expr::arn_of(queue_id).to_value(),
                    "Principal": {"AWS": "*"},
                    "Condition": {
                        "ForAnyValue:ArnEquals": {"aws:SourceArn": topic_arns},
                    },
                }],
            }),
        })
        .depends_on([queue_id]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::context::ContextMap;
    use crate::domain::project_config::ProjectConfig;

    const CONFIG: &str = r#"
project: acme
provider:
  bucket: acme-deployments
  region: us-east-1
contexts:
  widgets:
    events: [WidgetCreated]
    event_listeners:
      WidgetService: [WidgetCreated, orders.OrderPlaced]
    environment:
      FEATURE_X: "on"
      BUCKET: override-bucket
  orders:
    events: [OrderPlaced]
"#;

    fn setup(yaml: &str) -> (ProjectConfig, Deployment) {
        let config = ProjectConfig::from_yaml_str(yaml).unwrap();
        let deployment = Deployment::new(&config, "dev", "123456789012", &[]).unwrap();
        (config, deployment)
    }

    fn context_doc(yaml: &str) -> Value {
        let (config, deployment) = setup(yaml);
        let builder = ResourceGraphBuilder::new(&deployment, &config.provider);
        let map = ContextMap::from_config(&config);
        let widgets = map.get("widgets").unwrap();
        let topology = SubscriptionTopology::for_context(&map, widgets).unwrap();
        let stack = builder
            .build_context_stack(widgets, "lambda/code/acme-dev-widgets/x.zip", &topology)
            .unwrap();
        assert_eq!(stack.name, "acme-dev-widgets");
        stack.template.to_value().unwrap()
    }

    #[test]
    fn test_project_stack() {
        let (config, deployment) = setup(CONFIG);
        let stack = ResourceGraphBuilder::new(&deployment, &config.provider)
            .build_project_stack()
            .unwrap();
        assert_eq!(stack.name, "acme-dev");

        let doc = stack.template.to_value().unwrap();
        let resources = &doc["Resources"];
        assert_eq!(resources["AcmeDeployments"]["Properties"]["BucketName"], "acme-deployments");
        assert_eq!(
            resources["AcmeDeployments"]["Properties"]["LifecycleConfiguration"]["Rules"][0],
            json!({"Prefix": "tmp", "Status": "Enabled", "ExpirationInDays": 1})
        );
        assert_eq!(resources["AcmeDevApi"]["Properties"]["Name"], "Acme Dev API");
        assert_eq!(resources["AcmeDevApiRoute"]["Properties"]["RouteKey"], "$default");
        assert_eq!(resources["AcmeDevApiStage"]["Properties"]["StageName"], "v2");
        assert_eq!(
            resources["AcmeDevApiDeployment"]["DependsOn"],
            json!(["AcmeDevApiStage", "AcmeDevApiRoute", "AcmeDevApiIntegration", "AcmeDevApi"])
        );
        assert_eq!(
            doc["Outputs"]["AcmeDevApiId"],
            json!({"Value": {"Ref": "AcmeDevApi"}, "Export": {"Name": "AcmeDevApiId"}})
        );
        assert_eq!(doc["Parameters"]["AcmeDevMemorySize"]["Default"], "3008");
    }

    #[test]
    fn test_context_stack_functions_share_role() {
        let doc = context_doc(CONFIG);
        let resources = &doc["Resources"];
        let sync = &resources["AcmeDevWidgetsSync"]["Properties"];
        let asynchronous = &resources["AcmeDevWidgetsAsync"]["Properties"];

        let role = json!({"Fn::GetAtt": ["AcmeDevWidgetsExecutionRole", "Arn"]});
        assert_eq!(sync["Role"], role);
        assert_eq!(asynchronous["Role"], role);
        assert_eq!(sync["Timeout"], json!({"Ref": "AcmeDevWidgetsGatewayTimeout"}));
        assert_eq!(asynchronous["Timeout"], json!({"Ref": "AcmeDevWidgetsAsyncTimeout"}));
        assert_eq!(sync["Code"], json!({"S3Bucket": "acme-deployments", "S3Key": "lambda/code/acme-dev-widgets/x.zip"}));
        assert!(sync.get("VpcConfig").is_none());

        let env = &sync["Environment"]["Variables"];
        assert_eq!(env["CONTEXT"], "widgets");
        assert_eq!(env["PROJECT"], "acme");
        assert_eq!(env["FEATURE_X"], "on");
        assert_eq!(env["BUCKET"], "override-bucket");
    }

    #[test]
    fn test_context_stack_routes_and_permission() {
        let doc = context_doc(CONFIG);
        let resources = &doc["Resources"];
        assert_eq!(resources["AcmeDevApiWidgetsRouteBase"]["Properties"]["RouteKey"], "ANY /widgets");
        assert_eq!(
            resources["AcmeDevApiWidgetsRouteProxy"]["Properties"]["RouteKey"],
            "ANY /widgets/{proxy+}"
        );
        assert_eq!(
            resources["AcmeDevWidgetsSyncPermission"]["Properties"]["SourceArn"],
            json!({"Fn::Join": ["", [
                "arn:aws:execute-api:", "us-east-1", ":", "123456789012", ":",
                {"Fn::ImportValue": "AcmeDevApiId"}, "/*/*/", "widgets", "*"
            ]]})
        );
    }

    #[test]
    fn test_context_stack_queues() {
        let doc = context_doc(CONFIG);
        let resources = &doc["Resources"];
        let queue = &resources["AcmeDevWidgetsQueue"];
        assert_eq!(queue["Properties"]["VisibilityTimeout"], 905);
        assert_eq!(queue["Properties"]["MessageRetentionPeriod"], 1_209_600);
        assert_eq!(queue["Properties"]["RedrivePolicy"]["maxReceiveCount"], 1000);
        assert_eq!(queue["DependsOn"], json!(["AcmeDevWidgetsQueueDlq"]));

        let policy = &resources["AcmeDevWidgetsQueuePolicy"]["Properties"]["PolicyDocument"];
        assert_eq!(
            policy["Statement"][0]["Condition"]["ForAnyValue:ArnEquals"]["aws:SourceArn"],
            json!([
                "arn:aws:sns:us-east-1:123456789012:AcmeDevOrdersTopic",
                "arn:aws:sns:us-east-1:123456789012:AcmeDevWidgetsTopic",
            ])
        );
        assert!(resources.get("AcmeDevWidgetsQueueDlqPolicy").is_some());

        let mapping = &resources["AcmeDevWidgetsAsyncMapping"];
        assert_eq!(mapping["Properties"]["BatchSize"], 1);
        assert_eq!(mapping["Properties"]["FunctionName"], "AcmeDevWidgetsAsync");
        assert!(resources.get("AcmeDevWidgetsSubscription").is_some());
        assert!(resources.get("AcmeDevWidgetsOrdersSubscription").is_some());
    }

    #[test]
    fn test_optional_resources() {
        let doc = context_doc(CONFIG);
        assert!(doc["Resources"].get("AcmeDevWidgetsAlerts").is_none());

        let configured = CONFIG.replace(
            "  region: us-east-1\n",
            "  region: us-east-1\n  vpc:\n    security_group_ids: [sg-1]\n    subnet_ids: [subnet-1]\n  errors:\n    email:\n      recipients: ops@example.com\n",
        );
        let doc = context_doc(&configured);
        let resources = &doc["Resources"];
        assert_eq!(
            resources["AcmeDevWidgetsSync"]["Properties"]["VpcConfig"],
            json!({"SecurityGroupIds": ["sg-1"], "SubnetIds": ["subnet-1"]})
        );
        assert_eq!(resources["AcmeDevWidgetsAlerts"]["Type"], "AWS::SNS::Topic");
        assert_eq!(
            resources["AcmeDevWidgetsSyncErrorAlarm"]["Properties"]["Dimensions"],
            json!([{"Name": "FunctionName", "Value": "AcmeDevWidgetsSync"}])
        );
        assert!(resources.get("AcmeDevWidgetsAsyncErrorAlarm").is_some());
        assert_eq!(
            resources["AcmeDevWidgetsAlertsSubscription"]["Properties"]["Endpoint"],
            "ops@example.com"
        );
    }

    #[test]
    fn test_topic_stack() {
        let names = ResourceNames::new("acme", "dev", "us-east-1", "123456789012");
        let stack = build_topic_stack(&names, "billing").unwrap();
        assert_eq!(stack.name, "acme-dev-billing");
        assert_eq!(stack.template.resources().count(), 1);
        assert!(stack.template.resource("AcmeDevBillingTopic").is_some());
    }
}
