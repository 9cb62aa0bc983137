use quarry::{
    Cascade, Entity, EntityDeclaration, EntityType, FieldCell, FieldDeclaration,
    ForeignObjectDeclaration, LoadBehavior, ReferenceListDeclaration, tracked_fields,
};
use uuid::Uuid;

#[derive(Default, Debug, Clone)]
pub struct Department {
    pub id: FieldCell<i64>,
    pub name: FieldCell<String>,
}

impl Entity for Department {
    fn declare() -> EntityDeclaration {
        EntityDeclaration::table("departments")
            .field(FieldDeclaration::new::<i64>("id").primary_key())
            .field(FieldDeclaration::new::<String>("name"))
            .reference_list(
                ReferenceListDeclaration::new(
                    "employees",
                    EntityType::of::<Employee>(),
                    "department",
                )
                .cascade(Cascade::DELETE),
            )
    }
    tracked_fields!(id, name);
}

#[derive(Default, Debug, Clone)]
pub struct Manager {
    pub id: FieldCell<i64>,
    pub name: FieldCell<String>,
    pub department: FieldCell<Option<i64>>,
}

impl Entity for Manager {
    fn declare() -> EntityDeclaration {
        EntityDeclaration::table("managers")
            .field(FieldDeclaration::new::<i64>("id").primary_key())
            .field(FieldDeclaration::new::<String>("name"))
            .foreign(
                ForeignObjectDeclaration::new("department", EntityType::of::<Department>())
                    .column("department_id"),
            )
    }
    tracked_fields!(id, name, department);
}

#[derive(Default, Debug, Clone)]
pub struct Employee {
    pub id: FieldCell<i64>,
    pub name: FieldCell<String>,
    pub salary: FieldCell<f64>,
    pub active: FieldCell<bool>,
    pub manager: FieldCell<Option<i64>>,
    pub department: FieldCell<Option<i64>>,
    pub mentor: FieldCell<Option<i64>>,
}

impl Employee {
    pub fn new(name: &str, salary: f64) -> Self {
        let mut employee = Employee::default();
        employee.name.set(name.into());
        employee.salary.set(salary);
        employee.active.set(true);
        employee
    }
}

impl Entity for Employee {
    fn declare() -> EntityDeclaration {
        EntityDeclaration::table("employees")
            .field(FieldDeclaration::new::<i64>("id").primary_key())
            .field(FieldDeclaration::new::<String>("name"))
            .field(FieldDeclaration::new::<f64>("salary"))
            .field(FieldDeclaration::new::<bool>("active"))
            .foreign(
                ForeignObjectDeclaration::new("manager", EntityType::of::<Manager>())
                    .column("manager_id"),
            )
            .foreign(
                ForeignObjectDeclaration::new("department", EntityType::of::<Department>())
                    .column("department_id"),
            )
            .foreign(
                ForeignObjectDeclaration::new("mentor", EntityType::of::<Employee>())
                    .column("mentor_id"),
            )
    }
    tracked_fields!(id, name, salary, active, manager, department, mentor);
}

/// Keyed by a UUID, `revision` is maintained by the database.
#[derive(Default, Debug, Clone)]
pub struct Document {
    pub id: FieldCell<Uuid>,
    pub title: FieldCell<String>,
    pub revision: FieldCell<i64>,
}

impl Entity for Document {
    fn declare() -> EntityDeclaration {
        EntityDeclaration::table("documents")
            .field(FieldDeclaration::new::<Uuid>("id").primary_key())
            .field(FieldDeclaration::new::<String>("title"))
            .field(FieldDeclaration::new::<i64>("revision").read_only())
    }
    tracked_fields!(id, title, revision);
}

/// Only queried with `force()`.
#[derive(Default, Debug, Clone)]
pub struct AuditEntry {
    pub id: FieldCell<i64>,
    pub message: FieldCell<String>,
}

impl Entity for AuditEntry {
    fn declare() -> EntityDeclaration {
        EntityDeclaration::table("audit_entries")
            .load(LoadBehavior::ForceOnly)
            .field(FieldDeclaration::new::<i64>("id").primary_key())
            .field(FieldDeclaration::new::<String>("message"))
    }
    tracked_fields!(id, message);
}

/// Only keys are selected until the instance is reloaded.
#[derive(Default, Debug, Clone)]
pub struct Attachment {
    pub id: FieldCell<i64>,
    pub file_name: FieldCell<String>,
    pub payload: FieldCell<Vec<u8>>,
}

impl Entity for Attachment {
    fn declare() -> EntityDeclaration {
        EntityDeclaration::table("attachments")
            .load(LoadBehavior::OnDemand)
            .field(FieldDeclaration::new::<i64>("id").primary_key())
            .field(FieldDeclaration::new::<String>("file_name").insert_only())
            .field(FieldDeclaration::new::<Vec<u8>>("payload"))
    }
    tracked_fields!(id, file_name, payload);
}
