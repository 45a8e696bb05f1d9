//! Config command implementation.

use super::{section, tenant_id, Service};
use crate::cli::{ConfigAction, ConfigArgs};
use crate::config::read_payload;
use crate::error::Result;
use crate::output::Formatter;

/// Execute the config command.
pub fn execute_config(args: ConfigArgs, service: &Service, formatter: &Formatter) -> Result<()> {
    match args.action {
        ConfigAction::Show { tenant } => {
            let config = service.get_resolved_config(&tenant_id(&tenant)?)?;
            println!("{}", formatter.format_annotated(&config)?);
        }
        ConfigAction::Global => {
            let global = service.global()?;
            println!("{}", formatter.format_global(&global)?);
        }
        ConfigAction::Set {
            tenant,
            section: raw_section,
            payload,
        } => {
            let tenant = tenant_id(&tenant)?;
            let section = section(&raw_section)?;
            let config = service.put_override(&tenant, section, read_payload(&payload)?)?;
            println!(
                "{}",
                formatter.success(&format!("Updated {} override for {}", section, tenant))
            );
            println!("{}", formatter.format_annotated(&config)?);
        }
        ConfigAction::SetGlobal {
            section: raw_section,
            payload,
        } => {
            let section = section(&raw_section)?;
            service.put_global_section(section, read_payload(&payload)?)?;
            println!(
                "{}",
                formatter.success(&format!("Updated global {} section", section))
            );
        }
        ConfigAction::Reset {
            tenant,
            section: raw_section,
        } => {
            let tenant = tenant_id(&tenant)?;
            let section = section(&raw_section)?;
            let config = service.delete_override(&tenant, section)?;
            println!(
                "{}",
                formatter.success(&format!("Reset {} for {} to global values", section, tenant))
            );
            println!("{}", formatter.format_annotated(&config)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use crate::config::OutputFormat;
    use crate::error::CliError;
    use docket_domain::{Source, TenantId};
    use docket_pipeline::PipelineError;

    fn formatter() -> Formatter {
        Formatter::new(OutputFormat::Json, false)
    }

    fn acme() -> TenantId {
        TenantId::parse("acme").unwrap()
    }

    #[test]
    fn test_set_and_reset_model() {
        let (_dir, _gateway, service) = testing::service(&[]);

        let set = ConfigArgs {
            action: ConfigAction::Set {
                tenant: "acme".to_string(),
                section: "model".to_string(),
                payload: "\"tenant-model\"".to_string(),
            },
        };
        execute_config(set, &service, &formatter()).unwrap();
        let config = service.get_resolved_config(&acme()).unwrap();
        assert_eq!(config.model.value, "tenant-model");
        assert_eq!(config.model.source, Source::Override);

        let reset = ConfigArgs {
            action: ConfigAction::Reset {
                tenant: "acme".to_string(),
                section: "model".to_string(),
            },
        };
        execute_config(reset, &service, &formatter()).unwrap();
        let config = service.get_resolved_config(&acme()).unwrap();
        assert_eq!(config.model.source, Source::Global);
    }

    #[test]
    fn test_unknown_section() {
        let (_dir, _gateway, service) = testing::service(&[]);
        let args = ConfigArgs {
            action: ConfigAction::Reset {
                tenant: "acme".to_string(),
                section: "colors".to_string(),
            },
        };
        let result = execute_config(args, &service, &formatter());
        assert!(matches!(result, Err(CliError::InvalidInput(_))));
    }

    #[test]
    fn test_rejected_override_keeps_record() {
        let (_dir, _gateway, service) = testing::service(&[]);
        let args = ConfigArgs {
            action: ConfigAction::Set {
                tenant: "acme".to_string(),
                section: "tags".to_string(),
                payload: r#"{"missing": {"enabled": true}}"#.to_string(),
            },
        };
        let result = execute_config(args, &service, &formatter());
        assert!(matches!(result, Err(CliError::Pipeline(PipelineError::Validation(_)))));
        let config = service.get_resolved_config(&acme()).unwrap();
        assert!(config.tags.iter().all(|t| t.source == Source::Global));
    }
}
