//! `ShopAdminService`: back-office catalog, orders, and reporting.

use std::sync::Arc;

use tonic::{Request, Response, Status};

use tiendita_core::Price;
use tiendita_store::models::{NewCategory, NewProduct, OrderFilter, ProductPatch};
use tiendita_store::reporting::{DateRange, ReportingService};
use tiendita_store::{ShopBackend, StoreError, catalog::CatalogService};

use crate::proto::shop_admin_service_server::ShopAdminService;
use crate::status::to_status;
use crate::{auth, convert, proto};

const DEFAULT_PAGE_SIZE: i64 = 50;

/// Handler state for [`ShopAdminService`].
#[derive(Clone)]
pub struct ShopAdminApi {
    backend: Arc<dyn ShopBackend>,
}

impl ShopAdminApi {
    /// Create the service over a backend.
    #[must_use]
    pub fn new(backend: Arc<dyn ShopBackend>) -> Self {
        Self { backend }
    }

    async fn require_admin(&self, request: &Request<impl Send>) -> Result<(), Status> {
        auth::authenticate_admin(self.backend.as_ref(), request.metadata()).await?;
        Ok(())
    }
}

#[tonic::async_trait]
impl ShopAdminService for ShopAdminApi {
    async fn create_product(
        &self,
        request: Request<proto::CreateProductRequest>,
    ) -> Result<Response<proto::CreateProductResponse>, Status> {
        self.require_admin(&request).await?;
        let req = request.into_inner();

        let category_id = convert::parse_category_id(&req.category_id)?;
        let product = CatalogService::new(self.backend.as_ref())
            .create_product(NewProduct {
                name: req.name,
                description: req.description,
                price: Price::from_minor(req.price),
                image_url: req.image_url,
                stock: req.stock,
                category_id,
                currency_code: req.currency_code,
            })
            .await
            .map_err(to_status)?;

        Ok(Response::new(proto::CreateProductResponse {
            product: Some(convert::product_to_proto(product)),
        }))
    }

    async fn update_product(
        &self,
        request: Request<proto::UpdateProductRequest>,
    ) -> Result<Response<proto::UpdateProductResponse>, Status> {
        self.require_admin(&request).await?;
        let req = request.into_inner();

        let id = convert::parse_product_id(&req.id)?;
        let category_id = req
            .category_id
            .as_deref()
            .map(convert::parse_category_id)
            .transpose()?;
        let product = CatalogService::new(self.backend.as_ref())
            .update_product(
                id,
                ProductPatch {
                    name: req.name,
                    description: req.description,
                    price: req.price.map(Price::from_minor),
                    image_url: req.image_url,
                    stock: req.stock,
                    category_id,
                },
            )
            .await
            .map_err(to_status)?;

        Ok(Response::new(proto::UpdateProductResponse {
            product: Some(convert::product_to_proto(product)),
        }))
    }

    async fn delete_product(
        &self,
        request: Request<proto::DeleteProductRequest>,
    ) -> Result<Response<proto::DeleteProductResponse>, Status> {
        self.require_admin(&request).await?;
        let req = request.into_inner();

        let id = convert::parse_product_id(&req.id)?;
        CatalogService::new(self.backend.as_ref())
            .delete_product(id)
            .await
            .map_err(to_status)?;

        Ok(Response::new(proto::DeleteProductResponse {}))
    }

    async fn create_category(
        &self,
        request: Request<proto::CreateCategoryRequest>,
    ) -> Result<Response<proto::CreateCategoryResponse>, Status> {
        self.require_admin(&request).await?;
        let req = request.into_inner();

        let category = CatalogService::new(self.backend.as_ref())
            .create_category(NewCategory {
                name: req.name,
                description: req.description,
            })
            .await
            .map_err(to_status)?;

        Ok(Response::new(proto::CreateCategoryResponse {
            category: Some(convert::category_to_proto(category)),
        }))
    }

    async fn update_category(
        &self,
        request: Request<proto::UpdateCategoryRequest>,
    ) -> Result<Response<proto::UpdateCategoryResponse>, Status> {
        self.require_admin(&request).await?;
        let req = request.into_inner();

        let id = convert::parse_category_id(&req.id)?;
        let category = CatalogService::new(self.backend.as_ref())
            .update_category(
                id,
                NewCategory {
                    name: req.name,
                    description: req.description,
                },
            )
            .await
            .map_err(to_status)?;

        Ok(Response::new(proto::UpdateCategoryResponse {
            category: Some(convert::category_to_proto(category)),
        }))
    }

    async fn delete_category(
        &self,
        request: Request<proto::DeleteCategoryRequest>,
    ) -> Result<Response<proto::DeleteCategoryResponse>, Status> {
        self.require_admin(&request).await?;
        let req = request.into_inner();

        let id = convert::parse_category_id(&req.id)?;
        CatalogService::new(self.backend.as_ref())
            .delete_category(id)
            .await
            .map_err(to_status)?;

        Ok(Response::new(proto::DeleteCategoryResponse {}))
    }

    async fn list_orders(
        &self,
        request: Request<proto::ListOrdersRequest>,
    ) -> Result<Response<proto::ListOrdersResponse>, Status> {
        self.require_admin(&request).await?;
        let req = request.into_inner();

        let filter = OrderFilter {
            status: convert::order_status_filter(req.status)?,
            start_date: convert::parse_optional_datetime(&req.start_date, "start_date")?,
            end_date: convert::parse_optional_datetime(&req.end_date, "end_date")?,
            limit: if req.limit > 0 {
                req.limit
            } else {
                DEFAULT_PAGE_SIZE
            },
            offset: req.offset.max(0),
        };

        let page = self
            .backend
            .list_orders(filter)
            .await
            .map_err(|e| to_status(StoreError::from(e)))?;

        Ok(Response::new(proto::ListOrdersResponse {
            orders: page.orders.into_iter().map(convert::order_to_proto).collect(),
            total_count: page.total_count,
        }))
    }

    async fn update_order_status(
        &self,
        request: Request<proto::UpdateOrderStatusRequest>,
    ) -> Result<Response<proto::UpdateOrderStatusResponse>, Status> {
        self.require_admin(&request).await?;
        let req = request.into_inner();

        let id = convert::parse_order_id(&req.id)?;
        let status = convert::order_status_from_proto(req.status)?;
        let order = self
            .backend
            .update_order_status(id, status)
            .await
            .map_err(|e| to_status(StoreError::from(e)))?;

        Ok(Response::new(proto::UpdateOrderStatusResponse {
            order: Some(convert::order_to_proto(order)),
        }))
    }

    async fn get_sales_stats(
        &self,
        request: Request<proto::GetSalesStatsRequest>,
    ) -> Result<Response<proto::GetSalesStatsResponse>, Status> {
        self.require_admin(&request).await?;
        let req = request.into_inner();

        let start = convert::parse_datetime(&req.start_date, "start_date")?;
        let end = convert::parse_datetime(&req.end_date, "end_date")?;
        let range = DateRange::new(start, end).map_err(to_status)?;

        let stats = ReportingService::new(self.backend.as_ref())
            .sales_stats(range)
            .await
            .map_err(to_status)?;

        Ok(Response::new(convert::stats_to_proto(stats)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tiendita_core::{OrderStatus, UserId};
    use tiendita_store::models::OrderLine;
    use tiendita_store::testing::MemoryBackend;
    use tonic::metadata::MetadataValue;

    fn request_as<T>(token: &str, inner: T) -> Request<T> {
        let mut request = Request::new(inner);
        request.metadata_mut().insert(
            "authorization",
            MetadataValue::try_from(token).expect("ascii token"),
        );
        request
    }

    fn api_with_admin() -> (Arc<MemoryBackend>, ShopAdminApi) {
        let backend = Arc::new(MemoryBackend::new());
        backend.register_user("root", "root@example.com", true);
        backend.register_user("user", "ana@example.com", false);
        let api = ShopAdminApi::new(backend.clone());
        (backend, api)
    }

    #[tokio::test]
    async fn test_non_admin_is_denied() {
        let (_backend, api) = api_with_admin();

        let err = api
            .list_orders(request_as("user", proto::ListOrdersRequest::default()))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::PermissionDenied);
    }

    #[tokio::test]
    async fn test_product_crud_over_rpc() {
        let (backend, api) = api_with_admin();
        backend.add_currency("EUR", "\u{20ac}", 1.0, true);
        let category = backend.add_category("Pantry");

        let created = api
            .create_product(request_as(
                "root",
                proto::CreateProductRequest {
                    name: "Olive oil".to_string(),
                    description: "Extra virgin".to_string(),
                    price: 1200,
                    image_url: String::new(),
                    stock: 10,
                    category_id: category.to_string(),
                    currency_code: "EUR".to_string(),
                },
            ))
            .await
            .expect("create")
            .into_inner()
            .product
            .expect("product");
        assert_eq!(created.price, 1200);

        let updated = api
            .update_product(request_as(
                "root",
                proto::UpdateProductRequest {
                    id: created.id.clone(),
                    price: Some(1500),
                    ..Default::default()
                },
            ))
            .await
            .expect("update")
            .into_inner()
            .product
            .expect("product");
        assert_eq!(updated.price, 1500);
        assert_eq!(updated.name, "Olive oil");

        api.delete_product(request_as(
            "root",
            proto::DeleteProductRequest { id: created.id },
        ))
        .await
        .expect("delete");
    }

    #[tokio::test]
    async fn test_create_product_rejects_negative_price() {
        let (backend, api) = api_with_admin();
        let category = backend.add_category("Pantry");

        let err = api
            .create_product(request_as(
                "root",
                proto::CreateProductRequest {
                    name: "Olive oil".to_string(),
                    price: -1,
                    category_id: category.to_string(),
                    currency_code: "EUR".to_string(),
                    ..Default::default()
                },
            ))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test]
    async fn test_list_orders_filters_and_counts() {
        let (backend, api) = api_with_admin();
        let user_id = UserId::generate();
        let product = backend.add_product("Olive oil", 1200, 100);
        let line = OrderLine {
            product_id: product,
            quantity: 1,
            price: tiendita_core::Price::from_minor(1200),
        };
        let t = |d: u32| Utc.with_ymd_and_hms(2026, 3, d, 12, 0, 0).single().expect("date");
        backend.push_order(user_id, OrderStatus::Delivered, t(1), &[line]);
        backend.push_order(user_id, OrderStatus::Pending, t(2), &[line]);
        backend.push_order(user_id, OrderStatus::Delivered, t(3), &[line]);

        let page = api
            .list_orders(request_as(
                "root",
                proto::ListOrdersRequest {
                    status: proto::OrderStatus::Delivered as i32,
                    limit: 1,
                    ..Default::default()
                },
            ))
            .await
            .expect("list")
            .into_inner();
        assert_eq!(page.total_count, 2);
        assert_eq!(page.orders.len(), 1);
        // Newest first.
        assert_eq!(
            page.orders[0].status,
            proto::OrderStatus::Delivered as i32
        );
    }

    #[tokio::test]
    async fn test_update_order_status_requires_specified_value() {
        let (backend, api) = api_with_admin();
        let user_id = UserId::generate();
        let product = backend.add_product("Olive oil", 1200, 100);
        let id = backend.push_order(
            user_id,
            OrderStatus::Pending,
            Utc::now(),
            &[OrderLine {
                product_id: product,
                quantity: 1,
                price: tiendita_core::Price::from_minor(1200),
            }],
        );

        let err = api
            .update_order_status(request_as(
                "root",
                proto::UpdateOrderStatusRequest {
                    id: id.to_string(),
                    status: proto::OrderStatus::Unspecified as i32,
                },
            ))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::InvalidArgument);

        let order = api
            .update_order_status(request_as(
                "root",
                proto::UpdateOrderStatusRequest {
                    id: id.to_string(),
                    status: proto::OrderStatus::Shipped as i32,
                },
            ))
            .await
            .expect("update")
            .into_inner()
            .order
            .expect("order");
        assert_eq!(order.status, proto::OrderStatus::Shipped as i32);
    }

    #[tokio::test]
    async fn test_sales_stats_over_rpc() {
        let (backend, api) = api_with_admin();
        let user_id = UserId::generate();
        let category = backend.add_category("Pantry");
        let product = backend.add_product_in("Olive oil", 1200, 100, category);
        let line = OrderLine {
            product_id: product,
            quantity: 2,
            price: tiendita_core::Price::from_minor(1200),
        };
        let t = |d: u32, h: u32| {
            Utc.with_ymd_and_hms(2026, 3, d, h, 0, 0).single().expect("date")
        };
        backend.push_order(user_id, OrderStatus::Delivered, t(1, 9), &[line]);
        backend.push_order(user_id, OrderStatus::Delivered, t(1, 20), &[line]);
        backend.push_order(user_id, OrderStatus::Pending, t(2, 9), &[line]);

        let stats = api
            .get_sales_stats(request_as(
                "root",
                proto::GetSalesStatsRequest {
                    start_date: "2026-03-01T00:00:00Z".to_string(),
                    end_date: "2026-03-31T23:59:59Z".to_string(),
                },
            ))
            .await
            .expect("stats")
            .into_inner();

        // Two delivered orders of 2400 each; the pending one is excluded
        // from totals but its items still count on the boards.
        assert_eq!(stats.order_count, 2);
        assert_eq!(stats.total_sales, 4800);
        assert_eq!(stats.average_order_value, 2400);
        assert_eq!(stats.daily.len(), 1);
        assert_eq!(stats.daily[0].date, "2026-03-01");
        assert_eq!(stats.daily[0].order_count, 2);
        assert_eq!(stats.top_products.len(), 1);
        assert_eq!(stats.top_products[0].quantity_sold, 6);
        assert_eq!(stats.top_categories.len(), 1);
        assert_eq!(stats.top_categories[0].category_id, category.to_string());
    }

    #[tokio::test]
    async fn test_empty_range_average_is_zero() {
        let (_backend, api) = api_with_admin();

        let stats = api
            .get_sales_stats(request_as(
                "root",
                proto::GetSalesStatsRequest {
                    start_date: "2026-01-01T00:00:00Z".to_string(),
                    end_date: "2026-01-31T23:59:59Z".to_string(),
                },
            ))
            .await
            .expect("stats")
            .into_inner();
        assert_eq!(stats.order_count, 0);
        assert_eq!(stats.average_order_value, 0);
        assert!(stats.daily.is_empty());
    }
}
