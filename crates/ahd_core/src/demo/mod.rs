use time::{Duration, OffsetDateTime};

use crate::ingest::health_event::{RawAffectedEntity, RawHealthEvent};
use crate::normalize::timestamps::format_rfc3339;

fn at(now: OffsetDateTime, offset: Duration) -> Option<String> {
    Some(format_rfc3339(now + offset))
}

fn s(v: &str) -> Option<String> {
    Some(v.to_string())
}

/// The five fixture events served by the mock source, timestamped relative to `now`.
///
/// Accounts: two events share `111122223333` (PRD), one each for `444455556666` (NPR) and
/// `777788889999` (DEV); the ECS notification has no account so it lands in the unknown group.
pub fn demo_events(now: OffsetDateTime) -> Vec<RawHealthEvent> {
    vec![
        RawHealthEvent {
            arn: "arn:aws:health:us-east-1::event/EC2/AWS_EC2_OPERATIONAL_ISSUE/AWS_EC2_OPERATIONAL_ISSUE_USEAST1_EC2_20241130_001".to_string(),
            service: s("EC2"),
            event_type_code: s("AWS_EC2_OPERATIONAL_ISSUE"),
            event_type_category: s("issue"),
            region: s("us-east-1"),
            availability_zone: s("us-east-1a"),
            start_time: at(now, -Duration::hours(2)),
            end_time: None,
            last_updated_time: at(now, -Duration::minutes(30)),
            status_code: s("open"),
            event_scope_code: s("PUBLIC"),
            description: s("We are investigating connectivity issues affecting some EC2 instances in the US-East-1 region."),
            title: None,
            actionability: s("ACTION_REQUIRED"),
            environment: s("PRD"),
            account_id: s("111122223333"),
            account_alias: s("payments-prod"),
            affected_entities: Vec::new(),
        },
        RawHealthEvent {
            arn: "arn:aws:health:us-west-2::event/RDS/AWS_RDS_MAINTENANCE_SCHEDULED/AWS_RDS_MAINTENANCE_SCHEDULED_USWEST2_20241201".to_string(),
            service: s("RDS"),
            event_type_code: s("AWS_RDS_MAINTENANCE_SCHEDULED"),
            event_type_category: s("scheduledChange"),
            region: s("us-west-2"),
            availability_zone: None,
            start_time: at(now, Duration::hours(24)),
            end_time: at(now, Duration::hours(28)),
            last_updated_time: at(now, -Duration::hours(24)),
            status_code: s("upcoming"),
            event_scope_code: s("ACCOUNT_SPECIFIC"),
            description: s("Scheduled maintenance for RDS instances in US-West-2. Some instances may experience brief downtime."),
            title: None,
            actionability: s("ACTION_MAY_BE_REQUIRED"),
            environment: s("PRD"),
            account_id: s("111122223333"),
            account_alias: s("payments-prod"),
            affected_entities: Vec::new(),
        },
        RawHealthEvent {
            arn: "arn:aws:health:eu-west-1::event/S3/AWS_S3_OPERATIONAL_NOTIFICATION/AWS_S3_NOTIFICATION_EUWEST1_20241129".to_string(),
            service: s("S3"),
            event_type_code: s("AWS_S3_OPERATIONAL_NOTIFICATION"),
            event_type_category: s("issue"),
            region: s("eu-west-1"),
            availability_zone: None,
            start_time: at(now, -Duration::hours(12)),
            end_time: at(now, -Duration::hours(8)),
            last_updated_time: at(now, -Duration::hours(8)),
            status_code: s("closed"),
            event_scope_code: s("PUBLIC"),
            description: s("Resolved: S3 service degradation in EU-West-1 has been resolved. All services operating normally."),
            title: None,
            actionability: s("INFORMATIONAL"),
            environment: s("NPR"),
            account_id: s("444455556666"),
            account_alias: s("payments-staging"),
            affected_entities: Vec::new(),
        },
        RawHealthEvent {
            arn: "arn:aws:health:us-east-1::event/LAMBDA/AWS_LAMBDA_OPERATIONAL_ISSUE/AWS_LAMBDA_ISSUE_USEAST1_20241130".to_string(),
            service: s("LAMBDA"),
            event_type_code: s("AWS_LAMBDA_OPERATIONAL_ISSUE"),
            event_type_category: s("issue"),
            region: s("us-east-1"),
            availability_zone: None,
            start_time: at(now, -Duration::hours(6)),
            end_time: at(now, -Duration::hours(2)),
            last_updated_time: at(now, -Duration::hours(2)),
            status_code: s("closed"),
            event_scope_code: s("PUBLIC"),
            description: s("Resolved: Increased error rates for Lambda functions in US-East-1 have been resolved."),
            title: None,
            actionability: s("INFORMATIONAL"),
            environment: s("DEV"),
            account_id: s("777788889999"),
            account_alias: s("platform-dev"),
            affected_entities: Vec::new(),
        },
        RawHealthEvent {
            arn: "arn:aws:health:ap-southeast-1::event/ECS/AWS_ECS_SECURITY_NOTIFICATION/AWS_ECS_SECURITY_20241130".to_string(),
            service: s("ECS"),
            event_type_code: s("AWS_ECS_SECURITY_NOTIFICATION"),
            event_type_category: s("accountNotification"),
            region: s("ap-southeast-1"),
            availability_zone: None,
            start_time: at(now, -Duration::hours(1)),
            end_time: None,
            last_updated_time: at(now, -Duration::hours(1)),
            status_code: s("open"),
            event_scope_code: s("ACCOUNT_SPECIFIC"),
            description: s("Security notification: Please review your ECS task definitions for potential security improvements."),
            title: None,
            actionability: s("ACTION_REQUIRED"),
            environment: None,
            account_id: None,
            account_alias: None,
            affected_entities: Vec::new(),
        },
    ]
}

fn entity(ty: &str, arn: &str, value: &str, status: &str, updated: Option<String>) -> RawAffectedEntity {
    RawAffectedEntity {
        entity_type: s(ty),
        entity_value: s(value),
        entity_arn: s(arn),
        status: s(status),
        last_update_time: updated,
    }
}

/// Mock affected resources keyed by service. Services without fixtures have none.
pub fn demo_entities_for_service(service: &str, now: OffsetDateTime) -> Vec<RawAffectedEntity> {
    let recent = at(now, -Duration::minutes(30));
    match service {
        "EC2" => vec![
            entity(
                "AWS::EC2::Instance",
                "arn:aws:ec2:us-east-1:123456789012:instance/i-1234567890abcdef0",
                "i-1234567890abcdef0",
                "IMPAIRED",
                recent.clone(),
            ),
            entity(
                "AWS::EC2::Instance",
                "arn:aws:ec2:us-east-1:123456789012:instance/i-0987654321fedcba0",
                "i-0987654321fedcba0",
                "PENDING",
                recent,
            ),
        ],
        "RDS" => vec![entity(
            "AWS::RDS::DBInstance",
            "arn:aws:rds:us-west-2:123456789012:db:production-db-1",
            "production-db-1",
            "PENDING",
            at(now, -Duration::hours(24)),
        )],
        "S3" => vec![
            entity(
                "AWS::S3::Bucket",
                "arn:aws:s3:::production-bucket-1",
                "production-bucket-1",
                "RESOLVED",
                at(now, -Duration::hours(8)),
            ),
            entity(
                "AWS::S3::Bucket",
                "arn:aws:s3:::backup-bucket-2",
                "backup-bucket-2",
                "RESOLVED",
                at(now, -Duration::hours(8)),
            ),
        ],
        _ => Vec::new(),
    }
}
