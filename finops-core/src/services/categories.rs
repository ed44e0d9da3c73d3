use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::ServiceCost;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    Compute,
    Storage,
    Database,
    Networking,
    Analytics,
    MachineLearning,
    Security,
    Management,
    DeveloperTools,
    Integration,
    CustomerEngagement,
    SupportAndBilling,
    Other,
}

impl ServiceCategory {
    pub fn all() -> &'static [ServiceCategory] {
        &[
            ServiceCategory::Compute,
            ServiceCategory::Storage,
            ServiceCategory::Database,
            ServiceCategory::Networking,
            ServiceCategory::Analytics,
            ServiceCategory::MachineLearning,
            ServiceCategory::Security,
            ServiceCategory::Management,
            ServiceCategory::DeveloperTools,
            ServiceCategory::Integration,
            ServiceCategory::CustomerEngagement,
            ServiceCategory::SupportAndBilling,
            ServiceCategory::Other,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::Compute => "Compute",
            ServiceCategory::Storage => "Storage",
            ServiceCategory::Database => "Database",
            ServiceCategory::Networking => "Networking",
            ServiceCategory::Analytics => "Analytics",
            ServiceCategory::MachineLearning => "Machine Learning",
            ServiceCategory::Security => "Security",
            ServiceCategory::Management => "Management",
            ServiceCategory::DeveloperTools => "Developer Tools",
            ServiceCategory::Integration => "Integration",
            ServiceCategory::CustomerEngagement => "Customer Engagement",
            ServiceCategory::SupportAndBilling => "Support & Billing",
            ServiceCategory::Other => "Other",
        }
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

use ServiceCategory::*;

/// Known service names. Order matters for substring matching: the first
/// entry that matches wins.
const SERVICE_CATEGORIES: &[(&str, ServiceCategory)] = &[
    ("Amazon Elastic Compute Cloud", Compute),
    ("EC2 - Other", Compute),
    ("Amazon Elastic Container Service", Compute),
    ("Amazon EKS", Compute),
    ("AWS Lambda", Compute),
    ("Amazon Elastic Container Registry", Compute),
    ("AWS Fargate", Compute),
    ("Amazon Lightsail", Compute),
    ("EC2 Container Registry", Compute),
    ("Amazon Elastic Kubernetes Service", Compute),
    ("Amazon EC2 Container Service", Compute),
    ("Amazon Simple Storage Service", Storage),
    ("Amazon Elastic Block Store", Storage),
    ("Amazon Elastic File System", Storage),
    ("Amazon FSx", Storage),
    ("Amazon S3 Glacier", Storage),
    ("Storage Gateway", Storage),
    ("AWS Backup", Storage),
    ("Amazon Relational Database Service", Database),
    ("Amazon DynamoDB", Database),
    ("Amazon ElastiCache", Database),
    ("Amazon Redshift", Database),
    ("Amazon Neptune", Database),
    ("Amazon DocumentDB", Database),
    ("Amazon Timestream", Database),
    ("Amazon Quantum Ledger Database", Database),
    ("Amazon Keyspaces", Database),
    ("Amazon Aurora", Database),
    ("Amazon Virtual Private Cloud", Networking),
    ("Amazon CloudFront", Networking),
    ("Amazon Route 53", Networking),
    ("Elastic Load Balancing", Networking),
    ("AWS Direct Connect", Networking),
    ("Amazon API Gateway", Networking),
    ("Amazon VPC", Networking),
    ("AWS Global Accelerator", Networking),
    ("AWS Transit Gateway", Networking),
    ("Amazon Athena", Analytics),
    ("Amazon EMR", Analytics),
    ("Amazon Kinesis", Analytics),
    ("Amazon Managed Streaming for Apache Kafka", Analytics),
    ("Amazon OpenSearch Service", Analytics),
    ("Amazon QuickSight", Analytics),
    ("AWS Glue", Analytics),
    ("Amazon Elasticsearch Service", Analytics),
    ("Amazon Data Firehose", Analytics),
    ("Amazon SageMaker", MachineLearning),
    ("Amazon Comprehend", MachineLearning),
    ("Amazon Rekognition", MachineLearning),
    ("Amazon Polly", MachineLearning),
    ("Amazon Translate", MachineLearning),
    ("Amazon Lex", MachineLearning),
    ("Amazon Forecast", MachineLearning),
    ("Amazon Textract", MachineLearning),
    ("AWS Key Management Service", Security),
    ("AWS WAF", Security),
    ("Amazon GuardDuty", Security),
    ("AWS Shield", Security),
    ("AWS Certificate Manager", Security),
    ("AWS Secrets Manager", Security),
    ("AWS Identity and Access Management", Security),
    ("AWS IAM", Security),
    ("Amazon Inspector", Security),
    ("AWS Directory Service", Security),
    ("AWS CloudTrail", Management),
    ("Amazon CloudWatch", Management),
    ("AWS Config", Management),
    ("AWS Systems Manager", Management),
    ("AWS CloudFormation", Management),
    ("AWS Organizations", Management),
    ("AWS Control Tower", Management),
    ("AWS Trusted Advisor", Management),
    ("AWS Cost Explorer", Management),
    ("AWS CodeBuild", DeveloperTools),
    ("AWS CodeCommit", DeveloperTools),
    ("AWS CodeDeploy", DeveloperTools),
    ("AWS CodePipeline", DeveloperTools),
    ("AWS CodeStar", DeveloperTools),
    ("AWS X-Ray", DeveloperTools),
    ("Amazon Simple Queue Service", Integration),
    ("Amazon Simple Notification Service", Integration),
    ("Amazon MQ", Integration),
    ("AWS Step Functions", Integration),
    ("Amazon AppFlow", Integration),
    ("Amazon EventBridge", Integration),
    ("Amazon Connect", CustomerEngagement),
    ("Amazon Pinpoint", CustomerEngagement),
    ("Amazon Simple Email Service", CustomerEngagement),
    ("AWS Support", SupportAndBilling),
    ("AWS Billing", SupportAndBilling),
    ("Tax", SupportAndBilling),
];

/// Category for a Cost Explorer service name.
///
/// Exact matches win; otherwise the first known name that contains, or is
/// contained in, the service name (case-insensitive) decides.
pub fn categorize_service(service_name: &str) -> ServiceCategory {
    if let Some((_, category)) = SERVICE_CATEGORIES
        .iter()
        .find(|(known, _)| *known == service_name)
    {
        return *category;
    }

    let needle = service_name.trim().to_lowercase();
    if needle.is_empty() {
        return Other;
    }

    SERVICE_CATEGORIES
        .iter()
        .find(|(known, _)| {
            let known = known.to_lowercase();
            known.contains(&needle) || needle.contains(&known)
        })
        .map(|(_, category)| *category)
        .unwrap_or(Other)
}

/// Cost of one category, summed over its services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCost {
    pub category: ServiceCategory,
    pub amount: f64,
    pub service_count: usize,
}

/// Group service costs into categories, highest total first.
pub fn categorize_services(services: &[ServiceCost]) -> Vec<CategoryCost> {
    let mut totals: HashMap<ServiceCategory, CategoryCost> = HashMap::new();

    for service in services {
        let category = categorize_service(&service.service_name);
        let entry = totals.entry(category).or_insert(CategoryCost {
            category,
            amount: 0.0,
            service_count: 0,
        });
        entry.amount += service.amount;
        entry.service_count += 1;
    }

    let mut categories: Vec<CategoryCost> = totals.into_values().collect();
    categories.sort_by(|a, b| {
        b.amount
            .total_cmp(&a.amount)
            .then_with(|| a.category.cmp(&b.category))
    });
    categories
}
