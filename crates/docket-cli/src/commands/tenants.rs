//! Tenants command implementation.

use super::{tenant_id, Service};
use crate::cli::{TenantsAction, TenantsArgs};
use crate::error::Result;
use crate::output::Formatter;
use docket_domain::Tenant;

/// Execute the tenants command.
pub fn execute_tenants(args: TenantsArgs, service: &Service, formatter: &Formatter) -> Result<()> {
    match args.action {
        TenantsAction::List => {
            let tenants = service.list_tenants()?;
            println!("{}", formatter.format_tenants(&tenants)?);
        }
        TenantsAction::Add { id, name, folder } => {
            if !folder.is_dir() {
                println!(
                    "{}",
                    formatter.warning(&format!(
                        "Folder {} does not exist yet; runs will fail until it does",
                        folder.display()
                    ))
                );
            }
            let tenant = service.put_tenant(Tenant::new(tenant_id(&id)?, name, folder))?;
            println!("{}", formatter.success(&format!("Saved tenant {}", tenant.id)));
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
    use docket_domain::TenantId;

    fn formatter() -> Formatter {
        Formatter::new(OutputFormat::Table, false)
    }

    #[test]
    fn test_add_tenant() {
        let (dir, _gateway, service) = testing::service(&[]);
        let args = TenantsArgs {
            action: TenantsAction::Add {
                id: "globex".to_string(),
                name: "Globex".to_string(),
                folder: dir.path().join("globex"),
            },
        };
        execute_tenants(args, &service, &formatter()).unwrap();

        let tenant = service
            .get_tenant(&TenantId::parse("globex").unwrap())
            .unwrap();
        assert_eq!(tenant.name, "Globex");
        assert_eq!(service.list_tenants().unwrap().len(), 2);
    }

    #[test]
    fn test_add_rejects_bad_id() {
        let (dir, _gateway, service) = testing::service(&[]);
        let args = TenantsArgs {
            action: TenantsAction::Add {
                id: "Not Valid".to_string(),
                name: "x".to_string(),
                folder: dir.path().to_path_buf(),
            },
        };
        let result = execute_tenants(args, &service, &formatter());
        assert!(matches!(result, Err(CliError::InvalidInput(_))));
    }
}
