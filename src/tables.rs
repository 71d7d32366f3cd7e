use crate::route_table::{Meta, RouteDescriptor, RouteTable, TableError};

/// Title shared by the home view and the document title suffix.
pub const APP_TITLE: &str = "SOLMETEC";

// --- Shared Entries ---

fn login() -> RouteDescriptor {
    RouteDescriptor::new("/iniciar_sesion", "login", "views/public/UserLogin.vue")
        .with_meta(Meta::titled("Iniciar Sesión").public().guest_only())
}

fn main_view() -> RouteDescriptor {
    RouteDescriptor::new("/", "main", "views/general/Main.vue").with_meta(Meta::titled(APP_TITLE))
}

fn unauthorized() -> RouteDescriptor {
    RouteDescriptor::new("/no_autorizado", "unauthorized", "views/general/Unauthorized.vue")
        .with_meta(Meta::titled("Acceso Denegado").auth())
}

// No meta: the fallback is unguarded.
fn not_found() -> RouteDescriptor {
    RouteDescriptor::new("/:pathMatch(.*)*", "not_found", "views/general/NotFound.vue")
}

// --- Deployments ---

/// public_site
///
/// The minimal table served by the public deployment: login, home, the
/// unauthorized notice, and the fallback.
pub fn public_site() -> Result<RouteTable, TableError> {
    RouteTable::new(vec![login(), main_view(), unauthorized(), not_found()])
}

/// admin_panel
///
/// The full administration table. Nested resources follow the same layout:
/// list, `agregar` (create), `:id` (show), `:id/editar` (edit). `agregar` is
/// declared before `:id` so it is not captured as an id.
pub fn admin_panel() -> Result<RouteTable, TableError> {
    let users = |title: &str| Meta::titled(title).icon("mdi-account-multiple").auth().permission("users");
    let companies = |title: &str| Meta::titled(title).icon("mdi-domain").auth().permission("companies");
    let branches = |title: &str| Meta::titled(title).icon("mdi-store").auth().permission("branches");

    RouteTable::new(vec![
        // public
        login(),
        RouteDescriptor::new("/recuperar_contrasena", "password_recovery", "views/public/PasswordRecovery.vue")
            .with_meta(Meta::titled("Recuperar Contraseña").public().guest_only()),
        RouteDescriptor::new("/restablecer_contrasena/:token", "password_reset", "views/public/PasswordReset.vue")
            .with_meta(Meta::titled("Restablecer Contraseña").public().guest_only()),
        // general
        main_view(),
        RouteDescriptor::new("/perfil", "profile", "views/general/Profile.vue")
            .with_meta(Meta::titled("Mi Perfil").icon("mdi-account-circle").auth()),
        // users
        RouteDescriptor::new("/usuarios", "users", "views/users/UserList.vue").with_meta(users("Usuarios")),
        RouteDescriptor::new("/usuarios/agregar", "user_create", "views/users/UserForm.vue")
            .with_meta(users("Agregar Usuario")),
        RouteDescriptor::new("/usuarios/:id", "user_show", "views/users/UserShow.vue").with_meta(users("Usuario")),
        RouteDescriptor::new("/usuarios/:id/editar", "user_edit", "views/users/UserForm.vue")
            .with_meta(users("Editar Usuario")),
        // companies
        RouteDescriptor::new("/empresas", "companies", "views/companies/CompanyList.vue")
            .with_meta(companies("Empresas")),
        RouteDescriptor::new("/empresas/agregar", "company_create", "views/companies/CompanyForm.vue")
            .with_meta(companies("Agregar Empresa")),
        RouteDescriptor::new("/empresas/:id", "company_show", "views/companies/CompanyShow.vue")
            .with_meta(companies("Empresa")),
        RouteDescriptor::new("/empresas/:id/editar", "company_edit", "views/companies/CompanyForm.vue")
            .with_meta(companies("Editar Empresa")),
        // branches (nested under a company)
        RouteDescriptor::new("/empresas/:company_id/sucursales", "branches", "views/branches/BranchList.vue")
            .with_meta(branches("Sucursales")),
        RouteDescriptor::new(
            "/empresas/:company_id/sucursales/agregar",
            "branch_create",
            "views/branches/BranchForm.vue",
        )
        .with_meta(branches("Agregar Sucursal")),
        RouteDescriptor::new("/empresas/:company_id/sucursales/:id", "branch_show", "views/branches/BranchShow.vue")
            .with_meta(branches("Sucursal")),
        RouteDescriptor::new(
            "/empresas/:company_id/sucursales/:id/editar",
            "branch_edit",
            "views/branches/BranchForm.vue",
        )
        .with_meta(branches("Editar Sucursal")),
        unauthorized(),
        not_found(),
    ])
}
