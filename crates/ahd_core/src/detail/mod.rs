use serde::{Deserialize, Serialize};

use crate::domain::AffectedEntity;

const DEFAULT_CONSOLE_REGION: &str = "us-east-1";

/// Per-status counts for an incident's affected resources.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceSummary {
    pub pending: usize,
    pub resolved: usize,
    pub impaired: usize,
    pub unknown: usize,
}

impl ResourceSummary {
    pub fn from_entities(entities: &[AffectedEntity]) -> Self {
        let mut summary = Self::default();
        for e in entities {
            let status = e.status.as_deref().unwrap_or("unknown").to_lowercase();
            match status.as_str() {
                "pending" => summary.pending += 1,
                "resolved" => summary.resolved += 1,
                "impaired" => summary.impaired += 1,
                _ => summary.unknown += 1,
            }
        }
        summary
    }
}

/// Case-insensitive match on entity value or type. An empty search returns everything.
pub fn filter_entities<'a>(entities: &'a [AffectedEntity], search: &str) -> Vec<&'a AffectedEntity> {
    let search = search.trim().to_lowercase();
    if search.is_empty() {
        return entities.iter().collect();
    }
    entities
        .iter()
        .filter(|e| {
            [e.entity_value.as_deref(), e.entity_type.as_deref()]
                .into_iter()
                .flatten()
                .any(|v| v.to_lowercase().contains(&search))
        })
        .collect()
}

/// AWS console deep link for a resource, when the resource type is known.
///
/// `region` defaults to `us-east-1`. IAM links are always global.
pub fn console_url(
    entity_type: Option<&str>,
    entity_value: Option<&str>,
    region: Option<&str>,
) -> Option<String> {
    let ty = entity_type.filter(|s| !s.is_empty())?;
    let value = entity_value.filter(|s| !s.is_empty())?;
    let r = region.filter(|s| !s.is_empty()).unwrap_or(DEFAULT_CONSOLE_REGION);
    let console = format!("https://{r}.console.aws.amazon.com");

    let url = if ty.contains("EC2::Instance") && value.starts_with("i-") {
        format!("{console}/ec2/home?region={r}#InstanceDetails:instanceId={value}")
    } else if ty.contains("S3::Bucket") {
        format!("https://s3.console.aws.amazon.com/s3/buckets/{value}?region={r}")
    } else if ty.contains("Lambda::Function") {
        let name = value
            .split_once(":function:")
            .map(|(_, n)| n)
            .unwrap_or(value);
        format!("{console}/lambda/home?region={r}#/functions/{name}")
    } else if ty.contains("RDS::DBInstance") {
        format!("{console}/rds/home?region={r}#database:id={value}")
    } else if ty.contains("RDS::DBCluster") {
        format!("{console}/rds/home?region={r}#database:id={value};is-cluster=true")
    } else if ty.contains("EKS::Cluster") {
        format!("{console}/eks/home?region={r}#/clusters/{value}")
    } else if ty.contains("ECS::Cluster") {
        let name = value.rsplit('/').next().unwrap_or(value);
        format!("{console}/ecs/v2/clusters/{name}?region={r}")
    } else if ty.contains("IAM::User") {
        format!("https://us-east-1.console.aws.amazon.com/iam/home#/users/details/{value}")
    } else if ty.contains("IAM::Role") {
        format!("https://us-east-1.console.aws.amazon.com/iam/home#/roles/details/{value}")
    } else if ty.contains("CloudFormation::Stack") {
        format!(
            "{console}/cloudformation/home?region={r}#/stacks/stackinfo?stackId={}",
            urlencoding::encode(value)
        )
    } else if ty.contains("DynamoDB::Table") {
        format!("{console}/dynamodbv2/home?region={r}#table?name={value}")
    } else if ty.contains("SNS::Topic") {
        format!("{console}/sns/v3/home?region={r}#/topic/{value}")
    } else if ty.contains("SQS::Queue") {
        format!(
            "{console}/sqs/v3/home?region={r}#/queues/{}",
            urlencoding::encode(value)
        )
    } else if ty.contains("OpenSearchService::Domain") || ty.contains("Elasticsearch::Domain") {
        format!("{console}/aos/home?region={r}#/opensearch/domains/{value}")
    } else if ty.contains("ElastiCache::CacheCluster") {
        format!("{console}/elasticache/home?region={r}#/redis/{value}")
    } else {
        return None;
    };
    Some(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(ty: &str, value: &str, status: Option<&str>) -> AffectedEntity {
        AffectedEntity {
            entity_type: Some(ty.to_string()),
            entity_value: Some(value.to_string()),
            entity_arn: None,
            status: status.map(str::to_string),
            last_update_time: None,
        }
    }

    #[test]
    fn resource_summary_counts_case_insensitively() {
        let entities = vec![
            entity("AWS::EC2::Instance", "i-1", Some("IMPAIRED")),
            entity("AWS::EC2::Instance", "i-2", Some("pending")),
            entity("AWS::EC2::Instance", "i-3", Some("Resolved")),
            entity("AWS::EC2::Instance", "i-4", None),
            entity("AWS::EC2::Instance", "i-5", Some("degraded")),
        ];
        let s = ResourceSummary::from_entities(&entities);
        assert_eq!(
            s,
            ResourceSummary {
                pending: 1,
                resolved: 1,
                impaired: 1,
                unknown: 2
            }
        );
    }

    #[test]
    fn entity_search_matches_value_or_type() {
        let entities = vec![
            entity("AWS::S3::Bucket", "production-bucket-1", None),
            entity("AWS::EC2::Instance", "i-0abc", None),
        ];
        assert_eq!(filter_entities(&entities, "BUCKET").len(), 1);
        assert_eq!(filter_entities(&entities, "ec2").len(), 1);
        assert_eq!(filter_entities(&entities, "").len(), 2);
        assert!(filter_entities(&entities, "lambda").is_empty());
    }

    #[test]
    fn console_urls_for_known_types() {
        assert_eq!(
            console_url(Some("AWS::EC2::Instance"), Some("i-123"), Some("eu-west-1")).as_deref(),
            Some("https://eu-west-1.console.aws.amazon.com/ec2/home?region=eu-west-1#InstanceDetails:instanceId=i-123")
        );
        assert_eq!(
            console_url(
                Some("AWS::Lambda::Function"),
                Some("arn:aws:lambda:us-east-1:123:function:resize"),
                None
            )
            .as_deref(),
            Some("https://us-east-1.console.aws.amazon.com/lambda/home?region=us-east-1#/functions/resize")
        );
        assert_eq!(
            console_url(Some("AWS::ECS::Cluster"), Some("arn:aws:ecs:x:cluster/prod"), Some("us-west-2"))
                .as_deref(),
            Some("https://us-west-2.console.aws.amazon.com/ecs/v2/clusters/prod?region=us-west-2")
        );
        assert_eq!(
            console_url(Some("AWS::SQS::Queue"), Some("https://sqs/q 1"), None).as_deref(),
            Some("https://us-east-1.console.aws.amazon.com/sqs/v3/home?region=us-east-1#/queues/https%3A%2F%2Fsqs%2Fq%201")
        );
    }

    #[test]
    fn stack_ids_are_percent_encoded() {
        let stack = "arn:aws:cloudformation:eu-west-1:1111:stack/web (blue)/6f1e";
        assert_eq!(
            console_url(Some("AWS::CloudFormation::Stack"), Some(stack), Some("eu-west-1")).as_deref(),
            Some(
                "https://eu-west-1.console.aws.amazon.com/cloudformation/home?region=eu-west-1\
                 #/stacks/stackinfo?stackId=arn%3Aaws%3Acloudformation%3Aeu-west-1%3A1111%3Astack%2Fweb%20%28blue%29%2F6f1e"
            )
        );
    }

    #[test]
    fn console_url_requires_type_and_value() {
        assert_eq!(console_url(None, Some("i-1"), None), None);
        assert_eq!(console_url(Some("AWS::EC2::Instance"), None, None), None);
        // EC2 links only for instance ids.
        assert_eq!(console_url(Some("AWS::EC2::Instance"), Some("vol-1"), None), None);
        assert_eq!(console_url(Some("AWS::Glue::Job"), Some("etl"), None), None);
    }
}
